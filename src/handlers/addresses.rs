use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::{AppState, ListQuery, PaginatedResponse};

pub async fn list_addresses(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = pagination.normalized();
    let (addresses, total) = state.services.addresses.list_addresses(page, limit).await?;
    Ok(Json(PaginatedResponse::new(addresses, total, page, limit)))
}

pub async fn get_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let address = state.services.addresses.get_address(id).await?;
    Ok(Json(address))
}

pub async fn delete_address(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.addresses.delete_address(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
