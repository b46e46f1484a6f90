use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Address entity. Rows are shared by content: two customers (or a customer
/// and a supplier) with identical address data point at the same row, so
/// deletion is guarded by reference checks rather than ownership.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Address)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Postal code, 8 digits, stored without formatting
    pub postal_code: String,

    pub street: String,

    /// Free-form: house numbers can be "S/N" or carry lot/block suffixes
    pub number: String,

    /// Normalized on the way in: blank or whitespace-only becomes NULL
    #[sea_orm(nullable)]
    pub complement: Option<String>,

    pub neighborhood: String,
    pub city: String,

    /// Two-letter uppercase state code
    pub state: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::customer_address::Entity")]
    CustomerAddresses,
    #[sea_orm(has_many = "super::supplier::Entity")]
    Suppliers,
}

impl Related<super::customer_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomerAddresses.def()
    }
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suppliers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
