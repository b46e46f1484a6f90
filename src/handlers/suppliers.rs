use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::suppliers::{CreateSupplierInput, UpdateSupplierInput};
use crate::{AppState, ListQuery, PaginatedResponse};

pub async fn create_supplier(
    State(state): State<AppState>,
    Json(input): Json<CreateSupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.services.suppliers.create_supplier(input).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = pagination.normalized();
    let (suppliers, total) = state.services.suppliers.list_suppliers(page, limit).await?;
    Ok(Json(PaginatedResponse::new(suppliers, total, page, limit)))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.services.suppliers.get_supplier(id).await?;
    Ok(Json(supplier))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateSupplierInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let supplier = state.services.suppliers.update_supplier(id, input).await?;
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
