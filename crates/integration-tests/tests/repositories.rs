//! Repository queries that the HTTP suites only reach indirectly.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p perim-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use perim_core::CustomerId;
use perim_integration_tests::{TestContext, database_url, delivery_body};
use perim_server::db::{AddressRepository, DeliveryRepository};
use perim_server::models::DeliveryFilter;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use sqlx::Executor;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// A pool whose sessions run west of UTC, where local midnight lags UTC.
async fn sao_paulo_pool() -> PgPool {
    PgPoolOptions::new()
        .max_connections(2)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET TIME ZONE 'America/Sao_Paulo'").await?;
                Ok(())
            })
        })
        .connect(database_url().expose_secret())
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_list_addresses_for_several_customers() {
    let ctx = TestContext::new().await;
    let first = ctx.create_customer("Batch One").await;
    let second = ctx.create_customer("Batch Two").await;
    ctx.create_address(first, "Rua A", true).await;
    ctx.create_address(first, "Rua B", false).await;
    ctx.create_address(second, "Rua C", true).await;

    let addresses = AddressRepository::new(&ctx.pool)
        .list_for_customers(&[CustomerId::new(first), CustomerId::new(second)])
        .await
        .unwrap();

    let owners: Vec<i64> = addresses.iter().map(|a| a.customer_id.as_i64()).collect();
    assert_eq!(owners, vec![first, first, second]);
    assert!(addresses[0].principal);
    assert!(!addresses[1].principal);
    assert_eq!(addresses[2].street, "Rua C");
}

#[tokio::test]
#[ignore = "Requires TEST_DATABASE_URL"]
async fn test_date_filter_uses_utc_days_in_any_session_time_zone() {
    let ctx = TestContext::new().await;
    let customer_id = ctx.create_customer("Early Bird").await;
    let address = ctx.create_address(customer_id, "Rua Cedo", true).await;
    let mut body = delivery_body(customer_id, address["id"].as_i64().unwrap());
    body["scheduled_at"] = "2026-03-11T00:30:00Z".into();
    let (status, created) = ctx.send(Method::POST, "/api/deliveries", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create delivery: {created}");

    let pool = sao_paulo_pool().await;
    let repo = DeliveryRepository::new(&pool);
    let on = |day: &str| DeliveryFilter {
        customer: Some(CustomerId::new(customer_id)),
        start_date: Some(day.to_owned()),
        end_date: Some(day.to_owned()),
        ..DeliveryFilter::default()
    };

    assert_eq!(repo.count(&on("2026-03-11")).await.unwrap(), 1);
    assert_eq!(repo.count(&on("2026-03-10")).await.unwrap(), 0);
}
