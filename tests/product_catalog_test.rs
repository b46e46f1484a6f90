//! Catalog rules: SKU and barcode uniqueness, listing filters and manual
//! stock adjustments.

mod common;

use common::{unique_digits, TestCtx};
use rust_decimal_macros::dec;
use shop_api::errors::ServiceError;
use shop_api::services::products::{
    CreateProductInput, ProductFilters, StockAdjustmentInput,
};

fn product_input(supplier_id: uuid::Uuid, sku: &str, barcode: &str) -> CreateProductInput {
    CreateProductInput {
        sku: sku.to_string(),
        description: "Liquidificador 500W".to_string(),
        barcode: barcode.to_string(),
        purchase_price: dec!(40.00),
        sale_price: dec!(79.90),
        stock: 10,
        supplier_id,
    }
}

#[tokio::test]
async fn duplicate_sku_is_a_conflict() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;

    ctx.services
        .products
        .create_product(product_input(supplier.id, "BLEND-500", &unique_digits(13)))
        .await
        .unwrap();

    let err = ctx
        .services
        .products
        .create_product(product_input(supplier.id, "BLEND-500", &unique_digits(13)))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;
    let barcode = unique_digits(13);

    ctx.services
        .products
        .create_product(product_input(supplier.id, "BC-ONE", &barcode))
        .await
        .unwrap();

    let err = ctx
        .services
        .products
        .create_product(product_input(supplier.id, "BC-TWO", &barcode))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn unknown_supplier_is_not_found() {
    let ctx = TestCtx::new().await;

    let err = ctx
        .services
        .products
        .create_product(product_input(
            uuid::Uuid::new_v4(),
            "NO-SUPPLIER",
            &unique_digits(13),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn description_filter_is_case_insensitive() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;

    let mut blender = product_input(supplier.id, "FILTER-1", &unique_digits(13));
    blender.description = "Liquidificador Turbo".to_string();
    ctx.services.products.create_product(blender).await.unwrap();

    let mut toaster = product_input(supplier.id, "FILTER-2", &unique_digits(13));
    toaster.description = "Torradeira Compacta".to_string();
    ctx.services.products.create_product(toaster).await.unwrap();

    let (found, total) = ctx
        .services
        .products
        .list_products(
            ProductFilters {
                description: Some("LIQUIDIFICADOR".to_string()),
                supplier_id: None,
                max_stock: None,
            },
            1,
            20,
        )
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(found[0].sku, "FILTER-1");
}

#[tokio::test]
async fn supplier_and_max_stock_filters_combine() {
    let ctx = TestCtx::new().await;
    let supplier_a = ctx.seed_supplier().await;
    let supplier_b = ctx.seed_supplier().await;

    let mut low = product_input(supplier_a.id, "LOW-STOCK", &unique_digits(13));
    low.stock = 2;
    ctx.services.products.create_product(low).await.unwrap();

    let mut high = product_input(supplier_a.id, "HIGH-STOCK", &unique_digits(13));
    high.stock = 50;
    ctx.services.products.create_product(high).await.unwrap();

    let mut other = product_input(supplier_b.id, "OTHER-SUPPLIER", &unique_digits(13));
    other.stock = 1;
    ctx.services.products.create_product(other).await.unwrap();

    let (found, total) = ctx
        .services
        .products
        .list_products(
            ProductFilters {
                description: None,
                supplier_id: Some(supplier_a.id),
                max_stock: Some(5),
            },
            1,
            20,
        )
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(found[0].sku, "LOW-STOCK");
}

#[tokio::test]
async fn stock_adjustments_move_the_level() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;
    let product = ctx.seed_product(supplier.id, dec!(25.00), 10).await;

    let after_add = ctx
        .services
        .products
        .add_stock(product.id, StockAdjustmentInput { quantity: 5 })
        .await
        .unwrap();
    assert_eq!(after_add.stock, 15);

    let after_remove = ctx
        .services
        .products
        .remove_stock(product.id, StockAdjustmentInput { quantity: 12 })
        .await
        .unwrap();
    assert_eq!(after_remove.stock, 3);
}

#[tokio::test]
async fn removing_more_than_available_fails() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;
    let product = ctx.seed_product(supplier.id, dec!(25.00), 4).await;

    let err = ctx
        .services
        .products
        .remove_stock(product.id, StockAdjustmentInput { quantity: 5 })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientStock(_)));

    // Level unchanged after the failed removal.
    assert_eq!(
        ctx.services.products.get_product(product.id).await.unwrap().stock,
        4
    );
}

#[tokio::test]
async fn product_in_an_order_cannot_be_deleted() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;
    let supplier = ctx.seed_supplier().await;
    let product = ctx.seed_product(supplier.id, dec!(25.00), 4).await;

    ctx.services
        .orders
        .create_order(shop_api::services::orders::CreateOrderInput {
            customer_id: customer.id,
            delivery_address_id: ctx.primary_address_id(customer.id).await,
            items: vec![shop_api::services::orders::OrderItemInput {
                product_id: product.id,
                quantity: 1,
            }],
            payment_methods: vec![shop_api::entities::PaymentMethod::Pix],
            installments: None,
        })
        .await
        .unwrap();

    let err = ctx
        .services
        .products
        .delete_product(product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn supplier_with_products_cannot_be_deleted() {
    let ctx = TestCtx::new().await;
    let supplier = ctx.seed_supplier().await;
    ctx.seed_product(supplier.id, dec!(25.00), 4).await;

    let err = ctx
        .services
        .suppliers
        .delete_supplier(supplier.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}
