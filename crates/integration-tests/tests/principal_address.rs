//! Principal-address rule against a real database.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p perim-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use perim_core::{AddressId, CustomerId, PostalCode, RegionCode};
use perim_integration_tests::{TestContext, test_pool};
use perim_server::db::{AddressRepository, RepositoryError};
use perim_server::models::{AddressFields, AddressWrite};
use reqwest::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

fn fields(street: &str) -> AddressFields {
    AddressFields {
        postal_code: PostalCode::parse("80010-000").unwrap(),
        street: street.to_string(),
        number: "1".to_string(),
        complement: None,
        neighborhood: "Centro".to_string(),
        city: "Curitiba".to_string(),
        state: RegionCode::parse("PR").unwrap(),
    }
}

async fn principal_ids(pool: &PgPool, customer_id: CustomerId) -> Vec<AddressId> {
    AddressRepository::new(pool)
        .list_for_customer(customer_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.principal)
        .map(|a| a.id)
        .collect()
}

// =============================================================================
// Repository
// =============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_first_address_becomes_principal() {
    let ctx = TestContext::new().await;
    let customer_id = CustomerId::new(ctx.create_customer("First Address").await);

    let address = AddressRepository::new(&ctx.pool)
        .save(&AddressWrite::insert(customer_id, fields("Rua A"), false))
        .await
        .unwrap();

    assert!(address.principal);
    assert_eq!(principal_ids(&ctx.pool, customer_id).await, vec![address.id]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_new_principal_demotes_previous() {
    let ctx = TestContext::new().await;
    let customer_id = CustomerId::new(ctx.create_customer("Two Principals").await);
    let repo = AddressRepository::new(&ctx.pool);

    let first = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua A"), true))
        .await
        .unwrap();
    let second = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua B"), true))
        .await
        .unwrap();

    assert!(second.principal);
    assert_eq!(principal_ids(&ctx.pool, customer_id).await, vec![second.id]);
    assert!(!repo.get(customer_id, first.id).await.unwrap().unwrap().principal);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_unsetting_sole_principal_keeps_it() {
    let ctx = TestContext::new().await;
    let customer_id = CustomerId::new(ctx.create_customer("Sole Principal").await);
    let repo = AddressRepository::new(&ctx.pool);

    let only = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua A"), true))
        .await
        .unwrap();
    let updated = repo
        .save(&AddressWrite::update(only.id, customer_id, fields("Rua A2"), false))
        .await
        .unwrap();

    assert!(updated.principal);
    assert_eq!(updated.street, "Rua A2");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_deleting_principal_promotes_first_remaining() {
    let ctx = TestContext::new().await;
    let customer_id = CustomerId::new(ctx.create_customer("Delete Principal").await);
    let repo = AddressRepository::new(&ctx.pool);

    let zeta = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua Zeta"), false))
        .await
        .unwrap();
    let alpha = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua Alpha"), false))
        .await
        .unwrap();
    let principal = repo
        .save(&AddressWrite::insert(customer_id, fields("Rua Meio"), true))
        .await
        .unwrap();
    assert!(zeta.principal);
    assert_eq!(principal_ids(&ctx.pool, customer_id).await, vec![principal.id]);

    assert!(repo.delete(customer_id, principal.id).await.unwrap());

    assert_eq!(principal_ids(&ctx.pool, customer_id).await, vec![alpha.id]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_save_for_missing_customer_is_not_found() {
    let pool = test_pool().await;

    let err = AddressRepository::new(&pool)
        .save(&AddressWrite::insert(CustomerId::new(i64::MAX), fields("Rua A"), true))
        .await
        .unwrap_err();

    assert!(matches!(err, RepositoryError::NotFound));
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_concurrent_principal_writes_leave_exactly_one() {
    let ctx = TestContext::new().await;
    let customer_id = CustomerId::new(ctx.create_customer("Concurrent").await);

    let writers: Vec<_> = (0..8)
        .map(|i| {
            let pool = ctx.pool.clone();
            tokio::spawn(async move {
                AddressRepository::new(&pool)
                    .save(&AddressWrite::insert(
                        customer_id,
                        fields(&format!("Rua {i}")),
                        true,
                    ))
                    .await
            })
        })
        .collect();
    for writer in writers {
        writer.await.unwrap().unwrap();
    }

    assert_eq!(principal_ids(&ctx.pool, customer_id).await.len(), 1);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_database_rejects_second_principal() {
    let ctx = TestContext::new().await;
    let customer_id = ctx.create_customer("Index Guard").await;
    ctx.create_address(customer_id, "Rua A", true).await;

    let result = sqlx::query(
        r"
        INSERT INTO address
            (customer_id, postal_code, street, number, neighborhood, city, state, principal)
        VALUES ($1, '80010-000', 'Rua B', '2', 'Centro', 'Curitiba', 'PR', TRUE)
        ",
    )
    .bind(customer_id)
    .execute(&ctx.pool)
    .await;

    let err = result.unwrap_err();
    let db_err = err.as_database_error().unwrap();
    assert!(db_err.is_unique_violation());
}

// =============================================================================
// HTTP
// =============================================================================

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_customer_detail_reports_principal_address() {
    let ctx = TestContext::new().await;
    let customer_id = ctx.create_customer("Detail").await;
    ctx.create_address(customer_id, "Rua A", false).await;
    let second = ctx.create_address(customer_id, "Rua B", true).await;

    let (status, body) = ctx
        .send(Method::GET, &format!("/api/customers/{customer_id}"), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["addresses"].as_array().unwrap().len(), 2);
    assert_eq!(body["principal_address"]["id"], second["id"]);
    assert_eq!(body["addresses"][0]["id"], second["id"]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_principal_over_http_promotes_replacement() {
    let ctx = TestContext::new().await;
    let customer_id = ctx.create_customer("Http Delete").await;
    let principal = ctx.create_address(customer_id, "Rua A", true).await;
    let other = ctx.create_address(customer_id, "Rua B", false).await;
    let principal_id = principal["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/customers/{customer_id}/addresses/{principal_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = ctx
        .send(Method::GET, &format!("/api/customers/{customer_id}"), None)
        .await;
    assert_eq!(body["principal_address"]["id"], other["id"]);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_patch_principal_flag_moves_principal() {
    let ctx = TestContext::new().await;
    let customer_id = ctx.create_customer("Patch Principal").await;
    let first = ctx.create_address(customer_id, "Rua A", false).await;
    let second = ctx.create_address(customer_id, "Rua B", false).await;
    assert_eq!(first["principal"], true);
    assert_eq!(second["principal"], false);

    let second_id = second["id"].as_i64().unwrap();
    let (status, body) = ctx
        .send(
            Method::PATCH,
            &format!("/api/customers/{customer_id}/addresses/{second_id}"),
            Some(json!({ "principal": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"], true);

    let (_, detail) = ctx
        .send(Method::GET, &format!("/api/customers/{customer_id}"), None)
        .await;
    assert_eq!(detail["principal_address"]["id"], second["id"]);
}
