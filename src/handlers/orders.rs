use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{receivable, OrderStatus};
use crate::errors::ServiceError;
use crate::services::orders::{CreateOrderInput, OrderFilters};
use crate::{AppState, ListQuery, PaginatedResponse};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Create an order in awaiting_payment, freezing unit prices from the catalog",
    request_body = CreateOrderInput,
    responses(
        (status = 201, description = "Order created", body = crate::services::orders::OrderDetails),
        (status = 400, description = "Validation or business rule failure", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<CreateOrderInput>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state.services.orders.create_order(input).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    params(ListQuery, OrderFilters),
    responses(
        (status = 200, description = "Orders retrieved", body = PaginatedResponse<crate::entities::order::Model>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(pagination): Query<ListQuery>,
    Query(filters): Query<OrderFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let (page, limit) = pagination.normalized();
    let (orders, total) = state.services.orders.list_orders(filters, page, limit).await?;
    Ok(Json(PaginatedResponse::new(orders, total, page, limit)))
}

/// Orders of one customer, newest first.
pub async fn list_customer_orders(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Query(pagination): Query<ListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.customers.get_customer(customer_id).await?;

    let (page, limit) = pagination.normalized();
    let filters = OrderFilters {
        customer_id: Some(customer_id),
        status: None,
    };
    let (orders, total) = state.services.orders.list_orders(filters, page, limit).await?;
    Ok(Json(PaginatedResponse::new(orders, total, page, limit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order retrieved", body = crate::services::orders::OrderDetails),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state.services.orders.get_order(id).await?;
    Ok(Json(details))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/number/{number}",
    summary = "Get order by number",
    params(("number" = String, Path, description = "Human-facing order number")),
    responses(
        (status = 200, description = "Order retrieved", body = crate::services::orders::OrderDetails),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn get_order_by_number(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let details = state.services.orders.get_order_by_number(&number).await?;
    Ok(Json(details))
}

#[utoipa::path(
    patch,
    path = "/api/v1/orders/{id}/status",
    summary = "Update order status",
    description = "Apply a status transition with its stock and receivable side effects",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = crate::entities::order::Model),
        (status = 400, description = "Transition rejected", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateOrderStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let updated = state.services.orders.update_status(id, body.status).await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order is not deletable in its current status", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}/receivables",
    summary = "List order receivables",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Receivables retrieved", body = Vec<receivable::Model>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    tag = "orders"
)]
pub async fn list_order_receivables(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let entries = state.services.receivables.list_for_order(id).await?;
    Ok(Json(entries))
}
