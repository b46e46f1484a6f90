use crate::{
    entities::{address, customer, customer_address, order},
    errors::ServiceError,
    events::{Event, EventSender},
    services::addresses::{digits_only, AddressInput, AddressService},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerInput {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 11, max = 14, message = "tax id must have 11 digits"))]
    pub tax_id: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    pub phone: Option<String>,
    #[validate(length(min = 8, message = "password must have at least 8 characters"))]
    pub password: String,
    #[validate]
    pub address: AddressInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerInput {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: Option<String>,
    #[validate(email(message = "email is invalid"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CustomerService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Registers a customer together with their first address. The address
    /// is deduplicated against existing rows inside the same transaction.
    #[instrument(skip(self, input))]
    pub async fn create_customer(
        &self,
        input: CreateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let tax_id = digits_only(&input.tax_id);
        if tax_id.len() != 11 {
            return Err(ServiceError::ValidationFailed(vec![
                "tax_id: must have 11 digits".to_string(),
            ]));
        }
        let phone = input.phone.as_deref().map(digits_only).filter(|p| !p.is_empty());

        if customer::Entity::find()
            .filter(customer::Column::TaxId.eq(&tax_id))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A customer with this tax id already exists".to_string(),
            ));
        }

        if customer::Entity::find()
            .filter(customer::Column::Email.eq(&input.email))
            .one(&*self.db)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "A customer with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;

        let txn = self.db.begin().await?;

        let addr = AddressService::find_or_create(&txn, &input.address).await?;

        let now = Utc::now();
        let customer_id = Uuid::new_v4();
        let created = customer::ActiveModel {
            id: Set(customer_id),
            name: Set(input.name.trim().to_string()),
            tax_id: Set(tax_id),
            email: Set(input.email.clone()),
            phone: Set(phone),
            password_hash: Set(password_hash),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        customer_address::ActiveModel {
            customer_id: Set(customer_id),
            address_id: Set(addr.id),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        if let Err(e) = self.event_sender.send(Event::CustomerCreated(customer_id)).await {
            error!("Failed to publish customer created event: {}", e);
        }

        info!("Customer created: {}", customer_id);
        Ok(created)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<customer::Model>, u64), ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_asc(customer::Column::Name)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let customers = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((customers, total))
    }

    #[instrument(skip(self, input))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: UpdateCustomerInput,
    ) -> Result<customer::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_customer(id).await?;

        if let Some(email) = &input.email {
            let taken = customer::Entity::find()
                .filter(customer::Column::Email.eq(email))
                .filter(customer::Column::Id.ne(id))
                .one(&*self.db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "A customer with this email already exists".to_string(),
                ));
            }
        }

        let mut model: customer::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(email) = input.email {
            model.email = Set(email);
        }
        if let Some(phone) = input.phone {
            let digits = digits_only(&phone);
            model.phone = Set(if digits.is_empty() { None } else { Some(digits) });
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;

        if let Err(e) = self.event_sender.send(Event::CustomerUpdated(id)).await {
            error!("Failed to publish customer updated event: {}", e);
        }

        Ok(updated)
    }

    /// Customers with order history cannot be removed.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_customer(id).await?;

        let order_count = order::Entity::find()
            .filter(order::Column::CustomerId.eq(id))
            .count(&*self.db)
            .await?;
        if order_count > 0 {
            return Err(ServiceError::Conflict(
                "Customer has orders and cannot be deleted".to_string(),
            ));
        }

        customer::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        if let Err(e) = self.event_sender.send(Event::CustomerDeleted(id)).await {
            error!("Failed to publish customer deleted event: {}", e);
        }

        info!("Customer deleted: {}", id);
        Ok(())
    }

    /// Links an address to the customer, reusing an identical existing row.
    /// Re-adding an already linked address is a no-op.
    #[instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        customer_id: Uuid,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        self.get_customer(customer_id).await?;

        let txn = self.db.begin().await?;

        let addr = AddressService::find_or_create(&txn, &input).await?;

        let already_linked = customer_address::Entity::find_by_id((customer_id, addr.id))
            .one(&txn)
            .await?
            .is_some();

        if !already_linked {
            customer_address::ActiveModel {
                customer_id: Set(customer_id),
                address_id: Set(addr.id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(addr)
    }

    /// A customer must keep at least one address on file.
    #[instrument(skip(self))]
    pub async fn remove_address(
        &self,
        customer_id: Uuid,
        address_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.get_customer(customer_id).await?;

        let link = customer_address::Entity::find_by_id((customer_id, address_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Address {} is not linked to customer {}",
                    address_id, customer_id
                ))
            })?;

        let linked_count = customer_address::Entity::find()
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .count(&*self.db)
            .await?;
        if linked_count <= 1 {
            return Err(ServiceError::Conflict(
                "Customer must keep at least one address".to_string(),
            ));
        }

        customer_address::Entity::delete_by_id((link.customer_id, link.address_id))
            .exec(&*self.db)
            .await?;

        info!(
            "Address {} unlinked from customer {}",
            address_id, customer_id
        );
        Ok(())
    }

    pub async fn list_addresses(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<address::Model>, ServiceError> {
        self.get_customer(customer_id).await?;

        let addresses = address::Entity::find()
            .join(
                JoinType::InnerJoin,
                address::Relation::CustomerAddresses.def(),
            )
            .filter(customer_address::Column::CustomerId.eq(customer_id))
            .order_by_asc(address::Column::City)
            .all(&*self.db)
            .await?;

        Ok(addresses)
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{password_hash::PasswordHash, PasswordVerifier};

    #[test]
    fn hash_password_produces_verifiable_hash() {
        let hash = hash_password("correct horse battery").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"correct horse battery", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong password", &parsed)
            .is_err());
    }

    #[test]
    fn create_input_rejects_invalid_email() {
        let input = CreateCustomerInput {
            name: "Maria Silva".to_string(),
            tax_id: "123.456.789-09".to_string(),
            email: "not-an-email".to_string(),
            phone: None,
            password: "s3cret-pass".to_string(),
            address: AddressInput {
                postal_code: "01310-100".to_string(),
                street: "Av. Paulista".to_string(),
                number: "1000".to_string(),
                complement: None,
                neighborhood: "Bela Vista".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            },
        };
        assert!(input.validate().is_err());
    }
}
