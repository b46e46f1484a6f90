use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Product entity. `stock` is the count of sellable units; it is decremented
/// when an order's payment is approved and restored on cancellation, never
/// at order creation time.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Product)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Internal SKU, unique
    #[sea_orm(unique)]
    pub sku: String,

    pub description: String,

    /// Fiscal barcode (EAN-8 through GTIN-14), unique
    #[sea_orm(unique)]
    pub barcode: String,

    pub purchase_price: Decimal,

    /// Current sale price; orders snapshot it per item at creation time
    pub sale_price: Decimal,

    /// Never negative; over-decrement is rejected at the service layer
    pub stock: i32,

    pub supplier_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::supplier::Entity",
        from = "Column::SupplierId",
        to = "super::supplier::Column::Id"
    )]
    Supplier,
    #[sea_orm(has_many = "super::order_item::Entity")]
    OrderItems,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the product can satisfy the requested quantity.
    pub fn has_sufficient_stock(&self, quantity: i32) -> bool {
        quantity <= 0 || self.stock >= quantity
    }
}
