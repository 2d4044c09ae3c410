//! Customer API against a real database.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p perim-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use perim_integration_tests::{TestContext, unique_tax_id};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_duplicate_tax_id_is_field_error() {
    let ctx = TestContext::new().await;
    let tax_id = unique_tax_id();
    let body = json!({"name": "Original", "tax_id": tax_id, "phone": "(41) 3333-4444"});

    let (status, _) = ctx.send(Method::POST, "/api/customers", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let duplicate = json!({"name": "Copy", "tax_id": tax_id, "phone": "(41) 3333-5555"});
    let (status, body) = ctx
        .send(Method::POST, "/api/customers", Some(duplicate))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["tax_id"][0], "this tax id is already registered");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_put_keeping_own_tax_id_is_allowed() {
    let ctx = TestContext::new().await;
    let tax_id = unique_tax_id();
    let (_, created) = ctx
        .send(
            Method::POST,
            "/api/customers",
            Some(json!({"name": "Before", "tax_id": tax_id, "phone": "(41) 3333-4444"})),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/customers/{id}"),
            Some(json!({"name": "After", "tax_id": tax_id, "phone": "(41) 98888-7777"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "After");
    assert_eq!(body["phone"], "(41) 98888-7777");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_patch_changes_only_given_fields() {
    let ctx = TestContext::new().await;
    let id = ctx.create_customer("Patch Me").await;

    let (status, body) = ctx
        .send(
            Method::PATCH,
            &format!("/api/customers/{id}"),
            Some(json!({"name": "Patched"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Patched");
    assert_eq!(body["phone"], "(41) 99999-0000");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_delete_customer_cascades_addresses() {
    let ctx = TestContext::new().await;
    let id = ctx.create_customer("Cascade").await;
    let address = ctx.create_address(id, "Rua A", true).await;
    let address_id = address["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/api/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx
        .send(Method::GET, &format!("/api/customers/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "customer not found");

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM address WHERE id = $1")
        .bind(address_id)
        .fetch_one(&ctx.pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_search_matches_tax_id_and_paginates() {
    let ctx = TestContext::new().await;
    let tax_id = unique_tax_id();
    ctx.send(
        Method::POST,
        "/api/customers",
        Some(json!({"name": "Searchable", "tax_id": tax_id, "phone": "(41) 3333-4444"})),
    )
    .await;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/customers?search={tax_id}&page_size=5"),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 5);
    assert_eq!(body["results"][0]["tax_id"], tax_id.as_str());
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_unknown_customer_is_not_found() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx
        .send(Method::GET, &format!("/api/customers/{}", i64::MAX), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
