use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Join table holding an order's set of payment methods. Stored as the
/// snake_case string form of [`PaymentMethod`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub payment_method: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Payment methods accepted on an order. Credit card is the only installment
/// plan; every other method settles in a single receivable entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Boleto,
    Pix,
    Cash,
    BankTransfer,
}

impl PaymentMethod {
    /// Whether this method settles across multiple receivable installments.
    pub fn supports_installments(&self) -> bool {
        matches!(self, Self::CreditCard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn string_round_trip() {
        assert_eq!(PaymentMethod::CreditCard.to_string(), "credit_card");
        assert_eq!(
            PaymentMethod::from_str("bank_transfer").unwrap(),
            PaymentMethod::BankTransfer
        );
        assert!(PaymentMethod::from_str("check").is_err());
    }

    #[test]
    fn only_credit_card_supports_installments() {
        assert!(PaymentMethod::CreditCard.supports_installments());
        assert!(!PaymentMethod::Pix.supports_installments());
        assert!(!PaymentMethod::Boleto.supports_installments());
    }
}
