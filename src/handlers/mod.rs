pub mod addresses;
pub mod customers;
pub mod orders;
pub mod products;
pub mod suppliers;

use crate::events::EventSender;
use crate::services::{
    AddressService, CustomerService, OrderService, ProductService, ReceivableService,
    SupplierService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub use crate::AppState;

/// Service container used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub addresses: Arc<AddressService>,
    pub customers: Arc<CustomerService>,
    pub suppliers: Arc<SupplierService>,
    pub products: Arc<ProductService>,
    pub orders: Arc<OrderService>,
    pub receivables: Arc<ReceivableService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            addresses: Arc::new(AddressService::new(db.clone())),
            customers: Arc::new(CustomerService::new(db.clone(), event_sender.clone())),
            suppliers: Arc::new(SupplierService::new(db.clone(), event_sender.clone())),
            products: Arc::new(ProductService::new(db.clone(), event_sender.clone())),
            orders: Arc::new(OrderService::new(db.clone(), event_sender)),
            receivables: Arc::new(ReceivableService::new(db)),
        }
    }
}
