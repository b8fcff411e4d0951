use crate::error::ApiError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
///
/// # Arguments
/// * `database_url` - PostgreSQL connection string
///
/// # Returns
/// * `Result<DbPool>` - Configured connection pool or error
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Check if a category with the given name already exists
pub async fn check_duplicate_category(pool: &PgPool, name: &str) -> Result<bool, ApiError> {
    tracing::debug!("Checking for duplicate category: {}", name);

    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}

/// Check if a category with the given name already exists, excluding a specific ID
/// Used by update operations so a category can keep its own name.
pub async fn check_duplicate_category_excluding_id(
    pool: &PgPool,
    name: &str,
    exclude_id: i32,
) -> Result<bool, ApiError> {
    let exists: Option<bool> = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1 AND id != $2)",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;

    Ok(exists.unwrap_or(false))
}

/// Check if a coupon code is already taken
pub async fn check_duplicate_coupon_code(pool: &PgPool, code: &str) -> Result<bool, ApiError> {
    let exists: Option<bool> =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM coupons WHERE code = $1)")
            .bind(code)
            .fetch_one(pool)
            .await?;

    Ok(exists.unwrap_or(false))
}
