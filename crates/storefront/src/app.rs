//! Router assembly and backend bootstrap.
//!
//! `main` and the integration tests build the application through the same
//! two functions, so the tests exercise the production middleware stack.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    middleware::from_fn,
    routing::get,
};
use thiserror::Error;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;
use tracing::{info, warn};

use crate::config::EntityStoreConfig;
use crate::error::AppError;
use crate::gateway::{EntityStore, Gateway, GatewayError, HttpEntityStore, MemoryEntityStore};
use crate::middleware::{create_session_layer, request_id_middleware, request_span};
use crate::routes;
use crate::services::catalog::seed::{self, SeedError};
use crate::state::AppState;

/// Static assets, relative to the storefront crate.
const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Errors building the entity gateway at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to create entity API client: {0}")]
    Client(#[from] GatewayError),

    #[error("failed to seed in-memory catalog: {0}")]
    Seed(#[from] SeedError),
}

/// Build the entity gateway for `config`.
///
/// The in-memory backend is seeded from its catalog file; the hosted backend
/// is used as is.
///
/// # Errors
///
/// Returns an error if the HTTP client can't be built or the seed file can't
/// be loaded.
pub async fn build_gateway(config: &EntityStoreConfig) -> Result<Gateway, StartupError> {
    let store: Arc<dyn EntityStore> = match config {
        EntityStoreConfig::Remote(api) => {
            info!(api_url = %api.api_url, app_id = %api.app_id, "Using hosted entity API");
            Arc::new(HttpEntityStore::new(api)?)
        }
        EntityStoreConfig::Memory { seed_file } => {
            let store = MemoryEntityStore::new();
            let drafts = seed::load_seed_file(seed_file)?;
            let created = seed::seed_store(&store, &drafts).await?;
            info!(
                seed_file = %seed_file.display(),
                products = created,
                "Using in-memory entity store"
            );
            Arc::new(store)
        }
    };

    Ok(Gateway::new(store))
}

/// Build the full application router.
pub fn build_app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Checks the session database (when configured) and the catalog.
/// Returns 503 Service Unavailable if either is unreachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if let Some(pool) = state.pool()
        && let Err(e) = sqlx::query("SELECT 1").fetch_one(pool).await
    {
        warn!(error = %e, "Readiness: session database unreachable");
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    match state.catalog().list_all().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, backend = state.gateway().backend_tag(), "Readiness: catalog unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
