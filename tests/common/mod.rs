//! Common test utilities
//!
//! Integration tests need a Postgres instance; point TEST_DATABASE_URL (or
//! DATABASE_URL) at one. Without it, tests skip instead of failing. Each
//! test works under its own tenant id so tests can run in parallel without
//! stepping on each other.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};

/// Catalog configuration shared by all fixtures.
pub const CONFIG: i64 = 5;
/// Scope groups a tenant's balances can live under.
pub const SCOPE_A: i64 = 100;
pub const SCOPE_B: i64 = 200;
/// Stock type seeded in both scope groups.
pub const STOCK_TYPE: i64 = 10;
/// Stock type seeded only in SCOPE_A.
pub const STOCK_TYPE_A_ONLY: i64 = 11;
/// Inactive stock type in SCOPE_A.
pub const STOCK_TYPE_INACTIVE: i64 = 12;
/// Branches seeded for every fixture tenant.
pub const BRANCH_A: i64 = 7;
pub const BRANCH_B: i64 = 8;

/// Connect to the test database and ensure the schema exists.
/// Returns None (and the caller should skip) when no URL is configured.
pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test DB");

    // Schema is idempotent (IF NOT EXISTS throughout); the advisory lock
    // keeps parallel test binaries from racing on the DDL
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    sqlx::query("SELECT pg_advisory_lock(727001)")
        .execute(&mut *conn)
        .await
        .expect("Failed to take schema lock");
    (&mut *conn)
        .execute(include_str!("../../migrations/0001_init.sql"))
        .await
        .expect("Failed to apply schema");
    sqlx::query("SELECT pg_advisory_unlock(727001)")
        .execute(&mut *conn)
        .await
        .expect("Failed to release schema lock");
    drop(conn);

    Some(pool)
}

/// Seed branches and stock types for one tenant.
pub async fn seed_tenant(pool: &PgPool, tenant_id: i64) {
    for branch_id in [BRANCH_A, BRANCH_B] {
        sqlx::query(
            r#"
            INSERT INTO branches (id, tenant_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, id) DO NOTHING
            "#,
        )
        .bind(branch_id)
        .bind(tenant_id)
        .bind(format!("Branch {}", branch_id))
        .execute(pool)
        .await
        .expect("Failed to seed branch");
    }

    let stock_types = [
        (STOCK_TYPE, SCOPE_A, true),
        (STOCK_TYPE, SCOPE_B, true),
        (STOCK_TYPE_A_ONLY, SCOPE_A, true),
        (STOCK_TYPE_INACTIVE, SCOPE_A, false),
    ];
    for (stock_type_id, scope_group_id, active) in stock_types {
        sqlx::query(
            r#"
            INSERT INTO stock_types (id, tenant_id, catalog_configuration_id, scope_group_id, name, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (tenant_id, catalog_configuration_id, scope_group_id, id) DO NOTHING
            "#,
        )
        .bind(stock_type_id)
        .bind(tenant_id)
        .bind(CONFIG)
        .bind(scope_group_id)
        .bind(format!("Stock type {}", stock_type_id))
        .bind(active)
        .execute(pool)
        .await
        .expect("Failed to seed stock type");
    }
}

/// Number of persisted lines for one movement.
pub async fn line_count(pool: &PgPool, movement_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM movement_lines WHERE movement_id = $1")
        .bind(movement_id)
        .fetch_one(pool)
        .await
        .expect("Failed to count lines")
}
