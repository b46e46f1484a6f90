use crate::{
    entities::{order_item, product, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 50, message = "sku is required"))]
    pub sku: String,
    #[validate(length(min = 1, max = 255, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 8, max = 14, message = "barcode must have 8 to 14 digits"))]
    pub barcode: String,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    pub stock: i32,
    pub supplier_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255, message = "description is required"))]
    pub description: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// Catalog listing filters. All optional and combinable.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ProductFilters {
    /// Case-insensitive substring match on the description
    pub description: Option<String>,
    pub supplier_id: Option<Uuid>,
    /// Only products with stock at or below this level
    pub max_stock: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct StockAdjustmentInput {
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        validate_prices(input.purchase_price, input.sale_price)?;

        supplier::Entity::find_by_id(input.supplier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", input.supplier_id))
            })?;

        if product::Entity::find()
            .filter(product::Column::Sku.eq(&input.sku))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A product with this SKU already exists".to_string(),
            ));
        }

        if product::Entity::find()
            .filter(product::Column::Barcode.eq(&input.barcode))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A product with this barcode already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let product_id = Uuid::new_v4();
        let created = product::ActiveModel {
            id: Set(product_id),
            sku: Set(input.sku.trim().to_string()),
            description: Set(input.description.trim().to_string()),
            barcode: Set(input.barcode.trim().to_string()),
            purchase_price: Set(input.purchase_price),
            sale_price: Set(input.sale_price),
            stock: Set(input.stock),
            supplier_id: Set(input.supplier_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        if let Err(e) = self.event_sender.send(Event::ProductCreated(product_id)).await {
            error!("Failed to publish product created event: {}", e);
        }

        info!("Product created: {} (sku {})", product_id, created.sku);
        Ok(created)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    pub async fn get_product_by_sku(&self, sku: &str) -> Result<product::Model, ServiceError> {
        product::Entity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product with SKU {} not found", sku)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filters: ProductFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let mut query = product::Entity::find();

        if let Some(desc) = filters.description.as_deref().filter(|d| !d.trim().is_empty()) {
            query = query.filter(
                Expr::expr(Func::lower(Expr::col((
                    product::Entity,
                    product::Column::Description,
                ))))
                .like(format!("%{}%", desc.trim().to_lowercase())),
            );
        }

        if let Some(supplier_id) = filters.supplier_id {
            query = query.filter(product::Column::SupplierId.eq(supplier_id));
        }

        if let Some(max_stock) = filters.max_stock {
            query = query.filter(product::Column::Stock.lte(max_stock));
        }

        let paginator = query
            .order_by_asc(product::Column::Description)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((products, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_product(id).await?;

        let purchase = input.purchase_price.unwrap_or(existing.purchase_price);
        let sale = input.sale_price.unwrap_or(existing.sale_price);
        validate_prices(purchase, sale)?;

        let mut model: product::ActiveModel = existing.into();
        if let Some(description) = input.description {
            model.description = Set(description.trim().to_string());
        }
        model.purchase_price = Set(purchase);
        model.sale_price = Set(sale);
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        if let Err(e) = self.event_sender.send(Event::ProductUpdated(id)).await {
            error!("Failed to publish product updated event: {}", e);
        }

        Ok(updated)
    }

    /// Products referenced by order items cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(id).await?;

        let referenced = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(&*self.db)
            .await?;
        if referenced > 0 {
            return Err(ServiceError::Conflict(
                "Product appears in orders and cannot be deleted".to_string(),
            ));
        }

        product::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        if let Err(e) = self.event_sender.send(Event::ProductDeleted(id)).await {
            error!("Failed to publish product deleted event: {}", e);
        }

        info!("Product deleted: {}", id);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_stock(
        &self,
        id: Uuid,
        input: StockAdjustmentInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_product(id).await?;
        let old_quantity = existing.stock;
        let new_quantity = old_quantity + input.quantity;

        let mut model: product::ActiveModel = existing.into();
        model.stock = Set(new_quantity);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.publish_stock_adjusted(id, old_quantity, new_quantity).await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn remove_stock(
        &self,
        id: Uuid,
        input: StockAdjustmentInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_product(id).await?;
        if !existing.has_sufficient_stock(input.quantity) {
            return Err(ServiceError::InsufficientStock(format!(
                "Product {} has {} units in stock, requested {}",
                existing.sku, existing.stock, input.quantity
            )));
        }

        let old_quantity = existing.stock;
        let new_quantity = old_quantity - input.quantity;

        let mut model: product::ActiveModel = existing.into();
        model.stock = Set(new_quantity);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&*self.db).await?;

        self.publish_stock_adjusted(id, old_quantity, new_quantity).await;
        Ok(updated)
    }

    async fn publish_stock_adjusted(&self, product_id: Uuid, old_quantity: i32, new_quantity: i32) {
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
}

fn validate_prices(purchase: Decimal, sale: Decimal) -> Result<(), ServiceError> {
    let mut problems = Vec::new();
    if purchase <= Decimal::ZERO {
        problems.push("purchase_price: must be positive".to_string());
    }
    if sale <= Decimal::ZERO {
        problems.push("sale_price: must be positive".to_string());
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::ValidationFailed(problems))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn prices_must_be_positive() {
        assert!(validate_prices(dec!(10.00), dec!(15.00)).is_ok());
        assert!(validate_prices(dec!(0), dec!(15.00)).is_err());
        assert!(validate_prices(dec!(10.00), dec!(-1)).is_err());
    }

    #[test]
    fn stock_adjustment_rejects_non_positive_quantity() {
        assert!(StockAdjustmentInput { quantity: 0 }.validate().is_err());
        assert!(StockAdjustmentInput { quantity: -5 }.validate().is_err());
        assert!(StockAdjustmentInput { quantity: 1 }.validate().is_ok());
    }
}
