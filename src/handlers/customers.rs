use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::addresses::AddressInput;
use crate::services::customers::{CreateCustomerInput, UpdateCustomerInput};
use crate::{AppState, ListQuery, PaginatedResponse};

pub async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.create_customer(input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = pagination.normalized();
    let (customers, total) = state.services.customers.list_customers(page, limit).await?;
    Ok(Json(PaginatedResponse::new(customers, total, page, limit)))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.get_customer(id).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateCustomerInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let customer = state.services.customers.update_customer(id, input).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.customers.delete_customer(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_customer_addresses(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let addresses = state.services.customers.list_addresses(id).await?;
    Ok(Json(addresses))
}

pub async fn add_customer_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<AddressInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state.services.customers.add_address(id, input).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn remove_customer_address(
    State(state): State<AppState>,
    Path((id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .customers
        .remove_address(id, address_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
