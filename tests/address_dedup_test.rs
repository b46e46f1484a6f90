//! Addresses are shared rows deduplicated by content, with the complement
//! normalized so blank and absent mean the same thing.

mod common;

use common::{address_input, TestCtx};
use shop_api::entities::address;
use shop_api::errors::ServiceError;
use shop_api::services::AddressService;

#[tokio::test]
async fn identical_addresses_share_a_row() {
    let ctx = TestCtx::new().await;

    let first = AddressService::find_or_create(&*ctx.db, &address_input(Some("apt 12")))
        .await
        .unwrap();
    let second = AddressService::find_or_create(&*ctx.db, &address_input(Some("apt 12")))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn blank_and_missing_complement_are_the_same_address() {
    let ctx = TestCtx::new().await;

    let missing = AddressService::find_or_create(&*ctx.db, &address_input(None))
        .await
        .unwrap();
    let blank = AddressService::find_or_create(&*ctx.db, &address_input(Some("   ")))
        .await
        .unwrap();

    assert_eq!(missing.id, blank.id);
    assert_eq!(missing.complement, None);
}

#[tokio::test]
async fn different_complement_creates_a_new_row() {
    let ctx = TestCtx::new().await;

    let without = AddressService::find_or_create(&*ctx.db, &address_input(None))
        .await
        .unwrap();
    let with = AddressService::find_or_create(&*ctx.db, &address_input(Some("fundos")))
        .await
        .unwrap();

    assert_ne!(without.id, with.id);
}

#[tokio::test]
async fn postal_code_is_stored_digits_only() {
    let ctx = TestCtx::new().await;

    let mut input = address_input(None);
    input.postal_code = "01310-100".to_string();
    let created = AddressService::find_or_create(&*ctx.db, &input).await.unwrap();
    assert_eq!(created.postal_code, "01310100");

    input.postal_code = "01310100".to_string();
    let again = AddressService::find_or_create(&*ctx.db, &input).await.unwrap();
    assert_eq!(created.id, again.id);
}

#[tokio::test]
async fn customer_and_supplier_can_share_an_address() {
    let ctx = TestCtx::new().await;

    // seed_customer and seed_supplier use different complements, so force
    // the supplier's complement onto a customer-owned address first.
    let shared = AddressService::find_or_create(&*ctx.db, &address_input(Some("Galpão 3")))
        .await
        .unwrap();

    ctx.seed_supplier().await;

    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
    let rows = address::Entity::find()
        .filter(address::Column::Complement.eq("Galpão 3"))
        .all(&*ctx.db)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, shared.id);
}

#[tokio::test]
async fn referenced_address_cannot_be_deleted() {
    let ctx = TestCtx::new().await;

    let supplier = ctx.seed_supplier().await;
    let err = ctx
        .services
        .addresses
        .delete_address(supplier.address_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn unreferenced_address_is_deletable() {
    let ctx = TestCtx::new().await;

    let mut input = address_input(None);
    input.street = "Rua Sem Dono".to_string();
    let orphan = AddressService::find_or_create(&*ctx.db, &input).await.unwrap();

    ctx.services.addresses.delete_address(orphan.id).await.unwrap();

    let err = ctx.services.addresses.get_address(orphan.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}
