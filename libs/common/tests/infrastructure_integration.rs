//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database is properly configured and
//! accessible. They need a live server and run with `cargo test -- --ignored`.

use common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance (DATABASE_URL)"]
async fn test_database_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    Ok(())
}
