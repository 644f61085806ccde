//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! fc-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DISPATCH_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/dispatch/migrations/`, one table group per file:
//! ```text
//! migrations/
//! ├── 20261001000001_create_restaurants.sql
//! ├── 20261001000002_create_products.sql
//! └── ...
//! ```

use sqlx::PgPool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run the dispatch database migrations.
///
/// # Errors
///
/// Returns `MigrationError` if the URL is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DISPATCH_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| MigrationError::MissingEnvVar("DISPATCH_DATABASE_URL"))?;

    tracing::info!("Connecting to dispatch database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Running dispatch migrations...");
    sqlx::migrate!("../dispatch/migrations").run(&pool).await?;

    tracing::info!("Dispatch migrations complete!");
    Ok(())
}
