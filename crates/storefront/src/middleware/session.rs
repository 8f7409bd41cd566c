//! Session middleware configuration.
//!
//! Visitors are anonymous; the session only carries their cart token, so it
//! lives as long as the visitor keeps coming back.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "tipsy_sid";

/// Session expiry after inactivity, in seconds (1 year).
const SESSION_EXPIRY_SECONDS: i64 = 365 * 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// `PostgresStore` when a database is configured, `MemoryStore` otherwise.
/// The `PostgreSQL` sessions table must exist (`tipsy-cli migrate`).
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    config: &StorefrontConfig,
) -> SessionManagerLayer<S> {
    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
