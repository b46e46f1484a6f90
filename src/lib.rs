pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod migrator;
pub mod openapi;
pub mod request_context;
pub mod services;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::handlers::AppServices;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: Arc<EventSender>,
    pub services: AppServices,
}

/// Pagination query parameters, shared by every listing endpoint.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

impl ListQuery {
    /// Clamps the page size so a single request cannot scan the table.
    pub fn normalized(&self) -> (u64, u64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, 100);
        (page, limit)
    }
}

#[derive(Debug, serde::Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// All versioned API routes. Mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Customers
        .route("/customers", post(handlers::customers::create_customer))
        .route("/customers", get(handlers::customers::list_customers))
        .route("/customers/:id", get(handlers::customers::get_customer))
        .route("/customers/:id", put(handlers::customers::update_customer))
        .route(
            "/customers/:id",
            delete(handlers::customers::delete_customer),
        )
        .route(
            "/customers/:id/addresses",
            get(handlers::customers::list_customer_addresses),
        )
        .route(
            "/customers/:id/addresses",
            post(handlers::customers::add_customer_address),
        )
        .route(
            "/customers/:id/addresses/:address_id",
            delete(handlers::customers::remove_customer_address),
        )
        .route(
            "/customers/:id/orders",
            get(handlers::orders::list_customer_orders),
        )
        // Suppliers
        .route("/suppliers", post(handlers::suppliers::create_supplier))
        .route("/suppliers", get(handlers::suppliers::list_suppliers))
        .route("/suppliers/:id", get(handlers::suppliers::get_supplier))
        .route("/suppliers/:id", put(handlers::suppliers::update_supplier))
        .route(
            "/suppliers/:id",
            delete(handlers::suppliers::delete_supplier),
        )
        // Products
        .route("/products", post(handlers::products::create_product))
        .route("/products", get(handlers::products::list_products))
        .route("/products/:id", get(handlers::products::get_product))
        .route(
            "/products/sku/:sku",
            get(handlers::products::get_product_by_sku),
        )
        .route("/products/:id", put(handlers::products::update_product))
        .route("/products/:id", delete(handlers::products::delete_product))
        .route(
            "/products/:id/stock/add",
            post(handlers::products::add_stock),
        )
        .route(
            "/products/:id/stock/remove",
            post(handlers::products::remove_stock),
        )
        // Orders
        .route("/orders", post(handlers::orders::create_order))
        .route("/orders", get(handlers::orders::list_orders))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/number/:number",
            get(handlers::orders::get_order_by_number),
        )
        .route(
            "/orders/:id/status",
            patch(handlers::orders::update_order_status),
        )
        .route("/orders/:id", delete(handlers::orders::delete_order))
        .route(
            "/orders/:id/receivables",
            get(handlers::orders::list_order_receivables),
        )
        // Addresses
        .route("/addresses", get(handlers::addresses::list_addresses))
        .route("/addresses/:id", get(handlers::addresses::get_address))
        .route(
            "/addresses/:id",
            delete(handlers::addresses::delete_address),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_query_clamps_page_and_limit() {
        let q = ListQuery { page: 0, limit: 500 };
        assert_eq!(q.normalized(), (1, 100));

        let q = ListQuery { page: 3, limit: 0 };
        assert_eq!(q.normalized(), (3, 1));
    }

    #[test]
    fn paginated_response_computes_total_pages() {
        let resp = PaginatedResponse::new(vec![1, 2, 3], 45, 1, 20);
        assert_eq!(resp.total_pages, 3);

        let resp = PaginatedResponse::new(Vec::<i32>::new(), 0, 1, 20);
        assert_eq!(resp.total_pages, 0);
    }
}
