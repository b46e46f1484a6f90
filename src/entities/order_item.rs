use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order line item. `unit_price` is the product's sale price frozen at order
/// creation time and never changes afterward, regardless of later product
/// price updates.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[schema(as = OrderItem)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,
    pub product_id: Uuid,

    /// At least 1
    pub quantity: i32,

    /// Immutable snapshot of the product's sale price, scale 2
    pub unit_price: Decimal,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Subtotal = unit price × quantity, scale 2, half-up.
    pub fn subtotal(&self) -> Decimal {
        (self.unit_price * Decimal::from(self.quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(quantity: i32, unit_price: Decimal) -> Model {
        Model {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity,
            unit_price,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn subtotal_multiplies_and_rounds() {
        assert_eq!(item(2, dec!(50.00)).subtotal(), dec!(100.00));
        assert_eq!(item(3, dec!(19.99)).subtotal(), dec!(59.97));
    }

    #[test]
    fn subtotal_rounds_half_up() {
        // 3 × 33.335 = 100.005 → 100.01
        assert_eq!(item(3, dec!(33.335)).subtotal(), dec!(100.01));
    }
}
