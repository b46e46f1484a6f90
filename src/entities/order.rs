use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = Order)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-referenceable identifier, distinct from the internal id
    #[sea_orm(unique)]
    pub order_number: String,

    pub customer_id: Uuid,

    /// Must belong to the order's customer at creation time
    pub delivery_address_id: Uuid,

    pub status: OrderStatus,

    /// Always equals the sum of item subtotals, scale 2
    pub total: Decimal,

    /// Credit-card installment count; 1 for single-entry payment plans
    pub installments: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::DeliveryAddressId",
        to = "super::address::Column::Id"
    )]
    DeliveryAddress,
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
    #[sea_orm(has_many = "super::order_payment_method::Entity")]
    PaymentMethods,
    #[sea_orm(has_many = "super::receivable::Entity")]
    Receivables,
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::order_payment_method::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethods.def()
    }
}

impl Related<super::receivable::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Receivables.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Order lifecycle status. The happy path runs awaiting_payment →
/// payment_approved → picking → shipped → delivered; canceled and refunded
/// are reachable from any non-terminal state.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
    strum::EnumString,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "awaiting_payment")]
    AwaitingPayment,
    #[sea_orm(string_value = "payment_approved")]
    PaymentApproved,
    #[sea_orm(string_value = "picking")]
    Picking,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "canceled")]
    Canceled,
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

impl OrderStatus {
    /// Terminal states accept no transition to a different status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Whether an order in this status has had its items' stock decremented
    /// (stock is taken on payment approval, not at creation).
    pub fn stock_committed(&self) -> bool {
        matches!(
            self,
            Self::PaymentApproved | Self::Picking | Self::Shipped | Self::Delivered | Self::Refunded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use test_case::test_case;

    #[test_case(OrderStatus::Delivered => true)]
    #[test_case(OrderStatus::Canceled => true)]
    #[test_case(OrderStatus::Refunded => false)]
    #[test_case(OrderStatus::AwaitingPayment => false)]
    #[test_case(OrderStatus::Picking => false)]
    fn terminal_states(status: OrderStatus) -> bool {
        status.is_terminal()
    }

    #[test_case(OrderStatus::AwaitingPayment => false)]
    #[test_case(OrderStatus::PaymentApproved => true)]
    #[test_case(OrderStatus::Picking => true)]
    #[test_case(OrderStatus::Shipped => true)]
    #[test_case(OrderStatus::Delivered => true)]
    #[test_case(OrderStatus::Refunded => true)]
    #[test_case(OrderStatus::Canceled => false)]
    fn stock_commitment_follows_approval(status: OrderStatus) -> bool {
        status.stock_committed()
    }

    #[test]
    fn snake_case_round_trip() {
        assert_eq!(OrderStatus::PaymentApproved.to_string(), "payment_approved");
        assert_eq!(
            OrderStatus::from_str("awaiting_payment").unwrap(),
            OrderStatus::AwaitingPayment
        );
        assert!(OrderStatus::from_str("unknown").is_err());
    }
}
