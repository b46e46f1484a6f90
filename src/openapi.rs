use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities;
use crate::errors::ErrorResponse;
use crate::handlers;
use crate::services::{addresses, customers, orders, products, suppliers};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Shop API",
        description = "Order, catalog and customer management for a small e-commerce operation.

Orders freeze unit prices at creation, commit stock when payment is approved, and write
accounts-receivable entries per installment. Addresses are shared records deduplicated
by content.",
    ),
    paths(
        handlers::orders::create_order,
        handlers::orders::list_orders,
        handlers::orders::get_order,
        handlers::orders::get_order_by_number,
        handlers::orders::update_order_status,
        handlers::orders::delete_order,
        handlers::orders::list_order_receivables,
    ),
    components(schemas(
        ErrorResponse,
        entities::order::Model,
        entities::order_item::Model,
        entities::receivable::Model,
        entities::product::Model,
        entities::customer::Model,
        entities::supplier::Model,
        entities::address::Model,
        entities::OrderStatus,
        entities::PaymentMethod,
        addresses::AddressInput,
        customers::CreateCustomerInput,
        customers::UpdateCustomerInput,
        suppliers::CreateSupplierInput,
        suppliers::UpdateSupplierInput,
        products::CreateProductInput,
        products::UpdateProductInput,
        products::StockAdjustmentInput,
        orders::CreateOrderInput,
        orders::OrderItemInput,
        orders::OrderDetails,
        handlers::orders::UpdateOrderStatusRequest,
    )),
    tags(
        (name = "orders", description = "Order lifecycle and receivables")
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
