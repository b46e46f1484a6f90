//! Customer registration, uniqueness rules and the address book invariant
//! that every customer keeps at least one address.

mod common;

use common::{address_input, unique_digits, TestCtx};
use shop_api::errors::ServiceError;
use shop_api::services::customers::CreateCustomerInput;

fn customer_input(tax_id: &str, email: &str) -> CreateCustomerInput {
    CreateCustomerInput {
        name: "João Pereira".to_string(),
        tax_id: tax_id.to_string(),
        email: email.to_string(),
        phone: None,
        password: "senha-muito-boa".to_string(),
        address: address_input(None),
    }
}

#[tokio::test]
async fn duplicate_tax_id_is_a_conflict() {
    let ctx = TestCtx::new().await;
    let tax_id = unique_digits(11);

    ctx.services
        .customers
        .create_customer(customer_input(&tax_id, "first@example.com"))
        .await
        .unwrap();

    let err = ctx
        .services
        .customers
        .create_customer(customer_input(&tax_id, "second@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let ctx = TestCtx::new().await;

    ctx.services
        .customers
        .create_customer(customer_input(&unique_digits(11), "same@example.com"))
        .await
        .unwrap();

    let err = ctx
        .services
        .customers
        .create_customer(customer_input(&unique_digits(11), "same@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn tax_id_and_phone_are_normalized_to_digits() {
    let ctx = TestCtx::new().await;

    let mut input = customer_input("123.456.789-09", "digits@example.com");
    input.phone = Some("(11) 98765-4321".to_string());
    let created = ctx.services.customers.create_customer(input).await.unwrap();

    assert_eq!(created.tax_id, "12345678909");
    assert_eq!(created.phone.as_deref(), Some("11987654321"));
}

#[tokio::test]
async fn registration_links_the_first_address() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let addresses = ctx
        .services
        .customers
        .list_addresses(customer.id)
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1);
}

#[tokio::test]
async fn adding_an_identical_address_reuses_the_row() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let existing = &ctx.services.customers.list_addresses(customer.id).await.unwrap()[0];
    let readded = ctx
        .services
        .customers
        .add_address(customer.id, address_input(None))
        .await
        .unwrap();

    assert_eq!(existing.id, readded.id);
    // Still one link, not two.
    let addresses = ctx
        .services
        .customers
        .list_addresses(customer.id)
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1);
}

#[tokio::test]
async fn last_address_cannot_be_removed() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let addresses = ctx
        .services
        .customers
        .list_addresses(customer.id)
        .await
        .unwrap();
    let err = ctx
        .services
        .customers
        .remove_address(customer.id, addresses[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn extra_address_can_be_removed() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let second = ctx
        .services
        .customers
        .add_address(customer.id, address_input(Some("casa 2")))
        .await
        .unwrap();

    ctx.services
        .customers
        .remove_address(customer.id, second.id)
        .await
        .unwrap();

    let addresses = ctx
        .services
        .customers
        .list_addresses(customer.id)
        .await
        .unwrap();
    assert_eq!(addresses.len(), 1);
}

#[tokio::test]
async fn removing_an_unlinked_address_is_not_found() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let err = ctx
        .services
        .customers
        .remove_address(customer.id, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn password_hash_is_not_serialized() {
    let ctx = TestCtx::new().await;
    let customer = ctx.seed_customer().await;

    let json = serde_json::to_value(&customer).unwrap();
    assert!(json.get("password_hash").is_none());
    assert!(json.get("name").is_some());
}
