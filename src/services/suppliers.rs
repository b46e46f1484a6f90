use crate::{
    entities::{product, supplier},
    errors::ServiceError,
    events::{Event, EventSender},
    services::addresses::{digits_only, AddressInput, AddressService},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, max = 100, message = "legal name is required"))]
    pub legal_name: String,
    #[validate(length(min = 14, max = 18, message = "tax id must have 14 digits"))]
    pub tax_id: String,
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate]
    pub address: AddressInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateSupplierInput {
    #[validate(length(min = 1, max = 100, message = "legal name is required"))]
    pub legal_name: Option<String>,
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let tax_id = digits_only(&input.tax_id);
        if tax_id.len() != 14 {
            return Err(ServiceError::ValidationFailed(vec![
                "tax_id: must have 14 digits".to_string(),
            ]));
        }
        let phone = input.phone.as_deref().map(digits_only).filter(|p| !p.is_empty());

        if supplier::Entity::find()
            .filter(supplier::Column::TaxId.eq(&tax_id))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A supplier with this tax id already exists".to_string(),
            ));
        }

        if let Some(email) = &input.email {
            if supplier::Entity::find()
                .filter(supplier::Column::Email.eq(email))
                .one(&*self.db)
                .await?
                .is_some()
            {
                return Err(ServiceError::Conflict(
                    "A supplier with this email already exists".to_string(),
                ));
            }
        }

        let txn = self.db.begin().await?;

        let addr = AddressService::find_or_create(&txn, &input.address).await?;

        let now = Utc::now();
        let supplier_id = Uuid::new_v4();
        let created = supplier::ActiveModel {
            id: Set(supplier_id),
            legal_name: Set(input.legal_name.trim().to_string()),
            tax_id: Set(tax_id),
            email: Set(input.email.clone()),
            phone: Set(phone),
            address_id: Set(addr.id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::SupplierCreated(supplier_id)).await {
            error!("Failed to publish supplier created event: {}", e);
        }

        info!("Supplier created: {}", supplier_id);
        Ok(created)
    }

    pub async fn get_supplier(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let paginator = supplier::Entity::find()
            .order_by_asc(supplier::Column::LegalName)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let suppliers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((suppliers, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_supplier(id).await?;

        if let Some(email) = &input.email {
            let taken = supplier::Entity::find()
                .filter(supplier::Column::Email.eq(email))
                .filter(supplier::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "A supplier with this email already exists".to_string(),
                ));
            }
        }

        let mut model: supplier::ActiveModel = existing.into();
        if let Some(legal_name) = input.legal_name {
            model.legal_name = Set(legal_name.trim().to_string());
        }
        if let Some(email) = input.email {
            model.email = Set(Some(email));
        }
        if let Some(phone) = input.phone {
            let digits = digits_only(&phone);
            model.phone = Set(if digits.is_empty() { None } else { Some(digits) });
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        if let Err(e) = self.event_sender.send(Event::SupplierUpdated(id)).await {
            error!("Failed to publish supplier updated event: {}", e);
        }

        Ok(updated)
    }

    /// Suppliers with products in the catalog cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_supplier(id).await?;

        let product_count = product::Entity::find()
            .filter(product::Column::SupplierId.eq(id))
            .count(&*self.db)
            .await?;
        if product_count > 0 {
            return Err(ServiceError::Conflict(
                "Supplier has products and cannot be deleted".to_string(),
            ));
        }

        supplier::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        if let Err(e) = self.event_sender.send(Event::SupplierDeleted(id)).await {
            error!("Failed to publish supplier deleted event: {}", e);
        }

        info!("Supplier deleted: {}", id);
        Ok(())
    }
}
