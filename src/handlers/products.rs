use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::products::{
    CreateProductInput, ProductFilters, StockAdjustmentInput, UpdateProductInput,
};
use crate::{AppState, ListQuery, PaginatedResponse};

pub async fn create_product(
    State(state): State<AppState>,
    Json(input): Json<CreateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
    Query(filters): Query<ProductFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = pagination.normalized();
    let (products, total) = state
        .services
        .products
        .list_products(filters, page, limit)
        .await?;
    Ok(Json(PaginatedResponse::new(products, total, page, limit)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(Json(product))
}

pub async fn get_product_by_sku(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.get_product_by_sku(&sku).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.update_product(id, input).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StockAdjustmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.add_stock(id, input).await?;
    Ok(Json(product))
}

pub async fn remove_stock(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StockAdjustmentInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let product = state.services.products.remove_stock(id, input).await?;
    Ok(Json(product))
}
