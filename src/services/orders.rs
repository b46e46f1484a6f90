use crate::{
    entities::{
        customer_address, order, order_item, order_payment_method, product,
        OrderStatus, PaymentMethod,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::receivables::ReceivableService,
};
use chrono::Utc;
use rust_decimal::prelude::*;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

const MAX_INSTALLMENTS: i32 = 12;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderInput {
    pub customer_id: Uuid,
    /// Must be an address already registered for the customer.
    pub delivery_address_id: Uuid,
    pub items: Vec<OrderItemInput>,
    pub payment_methods: Vec<PaymentMethod>,
    /// Only meaningful when paying by credit card. Defaults to 1.
    pub installments: Option<i32>,
}

/// Listing filters, combinable with pagination.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct OrderFilters {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

/// An order with its line items and payment methods.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
    pub payment_methods: Vec<PaymentMethod>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Creates an order in `awaiting_payment`. Unit prices are copied from
    /// the catalog at this moment and never change afterwards, even if the
    /// product price does. Stock is only checked here; it is committed when
    /// the payment is approved.
    #[instrument(skip(self, input), fields(customer_id = %input.customer_id))]
    pub async fn create_order(
        &self,
        input: CreateOrderInput,
    ) -> Result<OrderDetails, ServiceError> {
        input.validate()?;
        let payment_methods = validate_order_input(&input)?;
        let installments = resolve_installments(&payment_methods, input.installments)?;

        crate::entities::customer::Entity::find_by_id(input.customer_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", input.customer_id))
            })?;

        let linked = customer_address::Entity::find()
            .filter(customer_address::Column::CustomerId.eq(input.customer_id))
            .filter(customer_address::Column::AddressId.eq(input.delivery_address_id))
            .one(&*self.db)
            .await?;
        if linked.is_none() {
            return Err(ServiceError::NotFound(format!(
                "Address {} is not registered for customer {}",
                input.delivery_address_id, input.customer_id
            )));
        }

        let txn = self.db.begin().await?;

        let order_id = Uuid::new_v4();
        let now = Utc::now();

        // First pass only reads the catalog; rows are written once the
        // parent order exists.
        let mut total = Decimal::ZERO;
        let mut lines = Vec::with_capacity(input.items.len());
        for item in &input.items {
            let prod = product::Entity::find_by_id(item.product_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if !prod.has_sufficient_stock(item.quantity) {
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {} has {} units in stock, requested {}",
                    prod.sku, prod.stock, item.quantity
                )));
            }

            let unit_price = prod
                .sale_price
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            total += unit_price * Decimal::from(item.quantity);
            lines.push(order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(prod.id),
                quantity: Set(item.quantity),
                unit_price: Set(unit_price),
                created_at: Set(now),
            });
        }

        let created = order::ActiveModel {
            id: Set(order_id),
            order_number: Set(generate_order_number()),
            customer_id: Set(input.customer_id),
            delivery_address_id: Set(input.delivery_address_id),
            status: Set(OrderStatus::AwaitingPayment),
            total: Set(total),
            installments: Set(installments),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            items.push(line.insert(&txn).await?);
        }

        for method in &payment_methods {
            order_payment_method::ActiveModel {
                order_id: Set(order_id),
                payment_method: Set(method.to_string()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::OrderCreated(order_id)).await {
            error!("Failed to publish order created event: {}", e);
        }

        info!(
            "Order {} created for customer {} with total {}",
            created.order_number, created.customer_id, created.total
        );

        Ok(OrderDetails {
            order: created,
            items,
            payment_methods,
        })
    }

    /// Moves an order to a new status, applying the stock and receivable
    /// side effects of the transition:
    ///   - first arrival at `payment_approved` commits stock and records
    ///     the receivables;
    ///   - cancellation after stock was committed restores it.
    /// Re-asserting the current status is a no-op. Delivered and canceled
    /// orders accept no other transition.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<order::Model, ServiceError> {
        let existing = self.find_order(id).await?;
        let old_status = existing.status;

        if old_status == new_status {
            return Ok(existing);
        }

        if old_status.is_terminal() {
            return Err(ServiceError::InvalidStatus(format!(
                "Order {} is {} and cannot change status",
                existing.order_number, old_status
            )));
        }

        let txn = self.db.begin().await?;

        let mut stock_deltas: Vec<(Uuid, i32, i32)> = Vec::new();
        let mut receivables_recorded = 0;

        if new_status == OrderStatus::PaymentApproved && !old_status.stock_committed() {
            stock_deltas = self.commit_stock(&txn, &existing).await?;
            let entries = ReceivableService::record_for_order(&txn, &existing).await?;
            receivables_recorded = entries.len() as i32;
        } else if new_status == OrderStatus::Canceled && old_status.stock_committed() {
            stock_deltas = self.restore_stock(&txn, &existing).await?;
        }

        let mut model: order::ActiveModel = existing.into();
        model.status = Set(new_status);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&txn).await?;

        txn.commit().await?;

        for (product_id, old_quantity, new_quantity) in stock_deltas {
            if let Err(e) = self
                .event_sender
                .send(Event::StockAdjusted {
                    product_id,
                    old_quantity,
                    new_quantity,
                })
                .await
            {
                error!("Failed to publish stock adjusted event: {}", e);
            }
        }

        if receivables_recorded > 0 {
            if let Err(e) = self
                .event_sender
                .send(Event::ReceivablesRecorded {
                    order_id: id,
                    installments: receivables_recorded,
                })
                .await
            {
                error!("Failed to publish receivables recorded event: {}", e);
            }
        }

        if let Err(e) = self
            .event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
        {
            error!("Failed to publish order status changed event: {}", e);
        }

        info!(
            "Order {} moved from {} to {}",
            updated.order_number, old_status, new_status
        );
        Ok(updated)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetails, ServiceError> {
        let order = self.find_order(id).await?;
        self.load_details(order).await
    }

    pub async fn get_order_by_number(&self, number: &str) -> Result<OrderDetails, ServiceError> {
        let order = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", number)))?;
        self.load_details(order).await
    }

    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        filters: OrderFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find();

        if let Some(customer_id) = filters.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        if let Some(status) = filters.status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let orders = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((orders, total))
    }

    /// Orders are only removable before payment or after cancellation.
    /// Items, payment methods and receivables go with the order.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find_order(id).await?;

        if !matches!(
            existing.status,
            OrderStatus::AwaitingPayment | OrderStatus::Canceled
        ) {
            return Err(ServiceError::Conflict(format!(
                "Order {} is {} and cannot be deleted",
                existing.order_number, existing.status
            )));
        }

        order::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        if let Err(e) = self.event_sender.send(Event::OrderDeleted(id)).await {
            error!("Failed to publish order deleted event: {}", e);
        }

        info!("Order {} deleted", existing.order_number);
        Ok(())
    }

    async fn find_order(&self, id: Uuid) -> Result<order::Model, ServiceError> {
        order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))
    }

    async fn load_details(&self, order: order::Model) -> Result<OrderDetails, ServiceError> {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .order_by_asc(order_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        let payment_methods = order_payment_method::Entity::find()
            .filter(order_payment_method::Column::OrderId.eq(order.id))
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|row| match PaymentMethod::from_str(&row.payment_method) {
                Ok(method) => Some(method),
                Err(_) => {
                    warn!(
                        "Order {} carries unknown payment method {:?}",
                        order.id, row.payment_method
                    );
                    None
                }
            })
            .collect();

        Ok(OrderDetails {
            order,
            items,
            payment_methods,
        })
    }

    /// Decrements stock for every line item, failing the whole transition
    /// if any product no longer has enough units.
    async fn commit_stock<C>(
        &self,
        conn: &C,
        order: &order::Model,
    ) -> Result<Vec<(Uuid, i32, i32)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(conn)
            .await?;

        let mut deltas = Vec::with_capacity(items.len());
        for item in items {
            let prod = product::Entity::find_by_id(item.product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            if !prod.has_sufficient_stock(item.quantity) {
                return Err(ServiceError::InsufficientStock(format!(
                    "Product {} has {} units in stock, order {} needs {}",
                    prod.sku, prod.stock, order.order_number, item.quantity
                )));
            }

            let old_quantity = prod.stock;
            let new_quantity = old_quantity - item.quantity;
            let mut model: product::ActiveModel = prod.into();
            model.stock = Set(new_quantity);
            model.updated_at = Set(Utc::now());
            model.update(conn).await?;

            deltas.push((item.product_id, old_quantity, new_quantity));
        }
        Ok(deltas)
    }

    async fn restore_stock<C>(
        &self,
        conn: &C,
        order: &order::Model,
    ) -> Result<Vec<(Uuid, i32, i32)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order.id))
            .all(conn)
            .await?;

        let mut deltas = Vec::with_capacity(items.len());
        for item in items {
            let prod = product::Entity::find_by_id(item.product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;

            let old_quantity = prod.stock;
            let new_quantity = old_quantity + item.quantity;
            let mut model: product::ActiveModel = prod.into();
            model.stock = Set(new_quantity);
            model.updated_at = Set(Utc::now());
            model.update(conn).await?;

            deltas.push((item.product_id, old_quantity, new_quantity));
        }
        Ok(deltas)
    }
}

/// Checks the structural rules the derive-based validation cannot express
/// and returns the deduplicated payment methods, preserving input order.
fn validate_order_input(input: &CreateOrderInput) -> Result<Vec<PaymentMethod>, ServiceError> {
    if input.items.is_empty() {
        return Err(ServiceError::BusinessRule(
            "An order needs at least one item".to_string(),
        ));
    }
    if input.items.iter().any(|i| i.quantity < 1) {
        return Err(ServiceError::ValidationFailed(vec![
            "items: quantity must be positive".to_string(),
        ]));
    }

    let mut duplicate_check = HashSet::new();
    if input
        .items
        .iter()
        .any(|i| !duplicate_check.insert(i.product_id))
    {
        return Err(ServiceError::BusinessRule(
            "An order cannot list the same product twice".to_string(),
        ));
    }

    if input.payment_methods.is_empty() {
        return Err(ServiceError::BusinessRule(
            "An order needs at least one payment method".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let methods: Vec<PaymentMethod> = input
        .payment_methods
        .iter()
        .copied()
        .filter(|m| seen.insert(*m))
        .collect();

    Ok(methods)
}

/// Installment plans only make sense for credit card payments.
fn resolve_installments(
    methods: &[PaymentMethod],
    requested: Option<i32>,
) -> Result<i32, ServiceError> {
    let installments = requested.unwrap_or(1);
    if installments < 1 || installments > MAX_INSTALLMENTS {
        return Err(ServiceError::ValidationFailed(vec![format!(
            "installments: must be between 1 and {}",
            MAX_INSTALLMENTS
        )]));
    }
    if installments > 1 && !methods.iter().any(|m| m.supports_installments()) {
        return Err(ServiceError::BusinessRule(
            "Installments require a credit card payment".to_string(),
        ));
    }
    Ok(installments)
}

fn generate_order_number() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!(
        "ORD-{}-{}",
        Utc::now().timestamp_millis(),
        uuid[..8].to_uppercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input_with(
        items: Vec<OrderItemInput>,
        payment_methods: Vec<PaymentMethod>,
        installments: Option<i32>,
    ) -> CreateOrderInput {
        CreateOrderInput {
            customer_id: Uuid::new_v4(),
            delivery_address_id: Uuid::new_v4(),
            items,
            payment_methods,
            installments,
        }
    }

    #[test]
    fn order_needs_items_and_payment_methods() {
        let input = input_with(vec![], vec![PaymentMethod::Pix], None);
        assert_matches!(validate_order_input(&input), Err(ServiceError::BusinessRule(_)));

        let input = input_with(
            vec![OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
            vec![],
            None,
        );
        assert_matches!(validate_order_input(&input), Err(ServiceError::BusinessRule(_)));
    }

    #[test]
    fn duplicate_products_are_rejected() {
        let product_id = Uuid::new_v4();
        let input = input_with(
            vec![
                OrderItemInput {
                    product_id,
                    quantity: 1,
                },
                OrderItemInput {
                    product_id,
                    quantity: 2,
                },
            ],
            vec![PaymentMethod::Pix],
            None,
        );
        assert_matches!(validate_order_input(&input), Err(ServiceError::BusinessRule(_)));
    }

    #[test]
    fn duplicate_payment_methods_collapse() {
        let input = input_with(
            vec![OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
            vec![PaymentMethod::Pix, PaymentMethod::Cash, PaymentMethod::Pix],
            None,
        );
        let methods = validate_order_input(&input).unwrap();
        assert_eq!(methods, vec![PaymentMethod::Pix, PaymentMethod::Cash]);
    }

    #[test]
    fn installments_require_credit_card() {
        let err = resolve_installments(&[PaymentMethod::Pix], Some(3)).unwrap_err();
        assert_matches!(err, ServiceError::BusinessRule(_));

        let ok = resolve_installments(&[PaymentMethod::CreditCard], Some(3)).unwrap();
        assert_eq!(ok, 3);

        // A single installment is fine with any method.
        assert_eq!(resolve_installments(&[PaymentMethod::Boleto], None).unwrap(), 1);
        assert_eq!(
            resolve_installments(&[PaymentMethod::Boleto], Some(1)).unwrap(),
            1
        );
    }

    #[test]
    fn installments_are_capped() {
        assert!(resolve_installments(&[PaymentMethod::CreditCard], Some(0)).is_err());
        assert!(resolve_installments(&[PaymentMethod::CreditCard], Some(13)).is_err());
    }

    #[test]
    fn order_number_has_expected_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.splitn(3, '-').collect();
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[2], parts[2].to_uppercase());
    }
}
