//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::gateway::Gateway;
use crate::services::{CartNotifier, CartService, CatalogReader, ContactIntake};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// services built on the shared entity gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: Option<PgPool>,
    gateway: Gateway,
    notifier: CartNotifier,
    catalog: CatalogReader,
    cart: CartService,
    contact: ContactIntake,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` pool backing sessions, if configured
    /// * `gateway` - Entity gateway all services share
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: Option<PgPool>, gateway: Gateway) -> Self {
        let notifier = CartNotifier::new();
        let catalog = CatalogReader::new(gateway.clone(), config.catalog_cache_ttl);
        let cart = CartService::new(gateway.clone(), notifier.clone());
        let contact = ContactIntake::new(gateway.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gateway,
                notifier,
                catalog,
                cart,
                contact,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the session database pool, if sessions are persisted in `PostgreSQL`.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the entity gateway.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }

    /// Get a reference to the cart change notifier.
    #[must_use]
    pub fn notifier(&self) -> &CartNotifier {
        &self.inner.notifier
    }

    /// Get a reference to the catalog reader.
    #[must_use]
    pub fn catalog(&self) -> &CatalogReader {
        &self.inner.catalog
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &CartService {
        &self.inner.cart
    }

    /// Get a reference to the contact intake.
    #[must_use]
    pub fn contact(&self) -> &ContactIntake {
        &self.inner.contact
    }
}
