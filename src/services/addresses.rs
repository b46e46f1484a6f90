use crate::{
    entities::address,
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Strips everything but ASCII digits. Postal codes, CPF/CNPJ and phone
/// numbers are stored in this canonical form.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Blank or whitespace-only complements collapse to None so that
/// "Rua X, apt " and "Rua X" with no complement dedup to the same row.
pub fn normalize_complement(complement: Option<&str>) -> Option<String> {
    complement
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddressInput {
    #[validate(length(min = 8, max = 9, message = "postal code must have 8 digits"))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 255, message = "street is required"))]
    pub street: String,
    #[validate(length(min = 1, max = 20, message = "number is required"))]
    pub number: String,
    #[validate(length(max = 100, message = "complement is too long"))]
    pub complement: Option<String>,
    #[validate(length(min = 1, max = 50, message = "neighborhood is required"))]
    pub neighborhood: String,
    #[validate(length(min = 1, max = 50, message = "city is required"))]
    pub city: String,
    #[validate(length(equal = 2, message = "state must be a two-letter code"))]
    pub state: String,
}

impl AddressInput {
    /// Canonical form used both for lookups and inserts.
    fn normalized(&self) -> NormalizedAddress {
        NormalizedAddress {
            postal_code: digits_only(&self.postal_code),
            street: self.street.trim().to_string(),
            number: self.number.trim().to_string(),
            complement: normalize_complement(self.complement.as_deref()),
            neighborhood: self.neighborhood.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_uppercase(),
        }
    }
}

struct NormalizedAddress {
    postal_code: String,
    street: String,
    number: String,
    complement: Option<String>,
    neighborhood: String,
    city: String,
    state: String,
}

#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Returns the existing address matching every normalized field, or
    /// inserts a new row. Generic over the connection so order creation can
    /// run it inside its transaction.
    #[instrument(skip(conn, input))]
    pub async fn find_or_create<C>(
        conn: &C,
        input: &AddressInput,
    ) -> Result<address::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        input.validate()?;
        let normalized = input.normalized();

        let mut query = address::Entity::find()
            .filter(address::Column::PostalCode.eq(&normalized.postal_code))
            .filter(address::Column::Street.eq(&normalized.street))
            .filter(address::Column::Number.eq(&normalized.number))
            .filter(address::Column::Neighborhood.eq(&normalized.neighborhood))
            .filter(address::Column::City.eq(&normalized.city))
            .filter(address::Column::State.eq(&normalized.state));

        query = match &normalized.complement {
            Some(complement) => query.filter(address::Column::Complement.eq(complement)),
            None => query.filter(address::Column::Complement.is_null()),
        };

        if let Some(existing) = query.one(conn).await? {
            return Ok(existing);
        }

        let model = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            postal_code: Set(normalized.postal_code),
            street: Set(normalized.street),
            number: Set(normalized.number),
            complement: Set(normalized.complement),
            neighborhood: Set(normalized.neighborhood),
            city: Set(normalized.city),
            state: Set(normalized.state),
            created_at: Set(Utc::now()),
        };

        let created = model.insert(conn).await?;
        info!("Address created: {}", created.id);
        Ok(created)
    }

    pub async fn get_address(&self, id: Uuid) -> Result<address::Model, ServiceError> {
        address::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_addresses(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<address::Model>, u64), ServiceError> {
        let paginator = address::Entity::find()
            .order_by_asc(address::Column::City)
            .paginate(&*self.db, limit);

        let total = paginator.num_items().await?;
        let addresses = paginator.fetch_page(page.saturating_sub(1)).await?;

        Ok((addresses, total))
    }

    /// Deleting an address still referenced by a customer, supplier or order
    /// is a conflict. The checks mirror the foreign keys.
    #[instrument(skip(self))]
    pub async fn delete_address(&self, id: Uuid) -> Result<(), ServiceError> {
        use crate::entities::{customer_address, order, supplier};

        let existing = self.get_address(id).await?;

        let linked_customers = customer_address::Entity::find()
            .filter(customer_address::Column::AddressId.eq(id))
            .count(&*self.db)
            .await?;
        if linked_customers > 0 {
            return Err(ServiceError::Conflict(
                "Address is linked to one or more customers".to_string(),
            ));
        }

        let linked_suppliers = supplier::Entity::find()
            .filter(supplier::Column::AddressId.eq(id))
            .count(&*self.db)
            .await?;
        if linked_suppliers > 0 {
            return Err(ServiceError::Conflict(
                "Address is linked to one or more suppliers".to_string(),
            ));
        }

        let linked_orders = order::Entity::find()
            .filter(order::Column::DeliveryAddressId.eq(id))
            .count(&*self.db)
            .await?;
        if linked_orders > 0 {
            return Err(ServiceError::Conflict(
                "Address is used as a delivery address".to_string(),
            ));
        }

        address::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!("Address deleted: {}", id);
        Ok(())
    }
}
