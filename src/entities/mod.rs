pub mod address;
pub mod customer;
pub mod customer_address;
pub mod order;
pub mod order_item;
pub mod order_payment_method;
pub mod product;
pub mod receivable;
pub mod supplier;

pub use order::OrderStatus;
pub use order_payment_method::PaymentMethod;

pub use address::Entity as Address;
pub use customer::Entity as Customer;
pub use customer_address::Entity as CustomerAddress;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use order_payment_method::Entity as OrderPaymentMethod;
pub use product::Entity as Product;
pub use receivable::Entity as Receivable;
pub use supplier::Entity as Supplier;
