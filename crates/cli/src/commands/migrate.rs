//! Session store migration.
//!
//! # Usage
//!
//! ```bash
//! tipsy-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! The storefront keeps nothing else in `PostgreSQL`, so the only schema is
//! the `tower_sessions.session` table owned by `tower-sessions-sqlx-store`.

use secrecy::SecretString;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use tipsy_tank_storefront::db;

/// Errors running the session migration.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create the session table if it doesn't exist.
///
/// # Errors
///
/// Returns an error if no database URL is set or the migration fails.
pub async fn sessions() -> Result<(), MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("STOREFRONT_DATABASE_URL"))?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running session store migration...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Session store migration complete!");
    Ok(())
}
