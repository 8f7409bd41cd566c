//! `PostgreSQL` connection for the session store.
//!
//! The storefront keeps no business data locally; the hosted entity store owns
//! products, cart lines and contact messages. `PostgreSQL` only backs
//! `tower-sessions` so visitor cart tokens survive restarts.
//!
//! # Migrations
//!
//! The sessions table is created explicitly:
//! ```bash
//! cargo run -p tipsy-tank-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
