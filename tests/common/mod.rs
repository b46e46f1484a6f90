//! Shared harness: in-memory SQLite database with the full schema applied
//! and the service container wired to a background event loop.
#![allow(dead_code)]

use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;

use shop_api::db::{establish_connection_with_config, run_migrations, DbConfig};
use shop_api::entities::{customer, product, supplier};
use shop_api::events::{process_events, EventSender};
use shop_api::handlers::AppServices;
use shop_api::services::addresses::AddressInput;
use shop_api::services::customers::CreateCustomerInput;
use shop_api::services::products::CreateProductInput;
use shop_api::services::suppliers::CreateSupplierInput;

pub struct TestCtx {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
}

impl TestCtx {
    pub async fn new() -> Self {
        // SQLite in-memory databases are per-connection, so the pool must
        // stay at a single connection.
        let config = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let db = Arc::new(
            establish_connection_with_config(&config)
                .await
                .expect("connect to in-memory sqlite"),
        );
        run_migrations(&db).await.expect("apply migrations");

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(process_events(rx));
        let services = AppServices::new(db.clone(), Arc::new(EventSender::new(tx)));

        Self { db, services }
    }

    pub async fn seed_customer(&self) -> customer::Model {
        self.services
            .customers
            .create_customer(CreateCustomerInput {
                name: "Maria Silva".to_string(),
                tax_id: unique_digits(11),
                email: format!("maria+{}@example.com", unique_digits(6)),
                phone: Some("(11) 98765-4321".to_string()),
                password: "s3nha-segura".to_string(),
                address: address_input(None),
            })
            .await
            .expect("seed customer")
    }

    /// The address registered by `seed_customer`, for use as a delivery
    /// address.
    pub async fn primary_address_id(&self, customer_id: uuid::Uuid) -> uuid::Uuid {
        self.services
            .customers
            .list_addresses(customer_id)
            .await
            .expect("list customer addresses")
            .first()
            .expect("customer has an address")
            .id
    }

    pub async fn seed_supplier(&self) -> supplier::Model {
        self.services
            .suppliers
            .create_supplier(CreateSupplierInput {
                legal_name: "Distribuidora Alfa Ltda".to_string(),
                tax_id: unique_digits(14),
                email: None,
                phone: None,
                address: address_input(Some("Galpão 3")),
            })
            .await
            .expect("seed supplier")
    }

    pub async fn seed_product(
        &self,
        supplier_id: uuid::Uuid,
        sale_price: Decimal,
        stock: i32,
    ) -> product::Model {
        self.services
            .products
            .create_product(CreateProductInput {
                sku: format!("SKU-{}", unique_digits(8)),
                description: "Cafeteira elétrica 110V".to_string(),
                barcode: unique_digits(13),
                purchase_price: sale_price / Decimal::from(2),
                sale_price,
                stock,
                supplier_id,
            })
            .await
            .expect("seed product")
    }
}

/// Deterministic-length unique digit strings for tax ids, barcodes, SKUs.
pub fn unique_digits(len: usize) -> String {
    let mut digits = uuid::Uuid::new_v4().as_u128().to_string();
    while digits.len() < len {
        digits.push_str(&uuid::Uuid::new_v4().as_u128().to_string());
    }
    digits[..len].to_string()
}

pub fn address_input(complement: Option<&str>) -> AddressInput {
    AddressInput {
        postal_code: "01310-100".to_string(),
        street: "Av. Paulista".to_string(),
        number: "1000".to_string(),
        complement: complement.map(str::to_string),
        neighborhood: "Bela Vista".to_string(),
        city: "São Paulo".to_string(),
        state: "SP".to_string(),
    }
}
