pub mod addresses;
pub mod customers;
pub mod orders;
pub mod products;
pub mod receivables;
pub mod suppliers;

pub use addresses::AddressService;
pub use customers::CustomerService;
pub use orders::OrderService;
pub use products::ProductService;
pub use receivables::ReceivableService;
pub use suppliers::SupplierService;
