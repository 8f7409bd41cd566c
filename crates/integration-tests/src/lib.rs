//! Integration tests for the Tipsy Tank storefront.
//!
//! Each test spawns the full application (production router and middleware)
//! on an ephemeral port, backed by an in-memory entity store seeded with the
//! bundled catalog and in-memory sessions. Requests go through a real HTTP
//! client with a cookie jar, so every [`TestApp`] is one visitor.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tipsy-tank-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, redirect::Policy};
use tower_sessions::MemoryStore;

use tipsy_tank_storefront::config::{EntityStoreConfig, StorefrontConfig};
use tipsy_tank_storefront::gateway::{Gateway, MemoryEntityStore};
use tipsy_tank_storefront::models::{CartItem, ContactMessage, Product};
use tipsy_tank_storefront::services::catalog::seed::{load_seed_file, seed_store};
use tipsy_tank_storefront::state::AppState;
use tipsy_tank_storefront::build_app;

/// Bundled catalog: five products across kits, extensions and bundles.
pub const CATALOG_FILE: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/../storefront/content/products.yaml"
);

/// A running storefront plus one visitor's HTTP client.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub store: Arc<MemoryEntityStore>,
    pub state: AppState,
}

/// Build a cookie-keeping client that doesn't follow redirects.
///
/// # Panics
///
/// Panics if the client can't be built.
#[must_use]
pub fn visitor_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: None,
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        entities: EntityStoreConfig::Memory {
            seed_file: CATALOG_FILE.into(),
        },
        catalog_cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
    }
}

impl TestApp {
    /// Seed a fresh store and serve the app on an ephemeral port.
    ///
    /// # Panics
    ///
    /// Panics if seeding or binding fails.
    pub async fn spawn() -> Self {
        let store = Arc::new(MemoryEntityStore::new());
        let drafts = load_seed_file(Path::new(CATALOG_FILE)).expect("Failed to load catalog");
        seed_store(store.as_ref(), &drafts)
            .await
            .expect("Failed to seed catalog");

        let state = AppState::new(test_config(), None, Gateway::new(store.clone()));
        let app = build_app(state.clone(), MemoryStore::default());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            client: visitor_client(),
            store,
            state,
        }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET `path` as this visitor.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// GET `path` and return the body.
    ///
    /// # Panics
    ///
    /// Panics if the request or body read fails.
    pub async fn get_text(&self, path: &str) -> String {
        self.get(path).await.text().await.expect("Failed to read body")
    }

    /// Plain form POST, as a browser without JavaScript sends it.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Form POST issued by HTMX.
    ///
    /// # Panics
    ///
    /// Panics if the request fails to send.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// A second visitor on the same server, with its own cookie jar.
    #[must_use]
    pub fn other_visitor(&self) -> Client {
        visitor_client()
    }

    /// Catalog id of the product with `slug`.
    ///
    /// # Panics
    ///
    /// Panics if no such product was seeded.
    pub async fn product_id(&self, slug: &str) -> String {
        let products: Vec<Product> = self.gateway().list().await.expect("Failed to list");
        products
            .into_iter()
            .find(|p| p.slug == slug)
            .map(|p| p.id.into_inner())
            .unwrap_or_else(|| panic!("No product with slug {slug}"))
    }

    /// Add the product with `slug` to this visitor's cart via HTMX.
    ///
    /// # Panics
    ///
    /// Panics if the add doesn't succeed.
    pub async fn add_to_cart(&self, slug: &str) {
        let id = self.product_id(slug).await;
        let response = self.htmx_post("/cart/add", &[("product_id", id.as_str())]).await;
        assert!(
            response.status().is_success(),
            "add {slug} failed: {}",
            response.status()
        );
    }

    /// Every cart line in the store, across all visitors.
    ///
    /// # Panics
    ///
    /// Panics if the store read fails.
    pub async fn cart_lines(&self) -> Vec<CartItem> {
        self.gateway().list().await.expect("Failed to list cart lines")
    }

    /// Every stored contact message.
    ///
    /// # Panics
    ///
    /// Panics if the store read fails.
    pub async fn contact_messages(&self) -> Vec<ContactMessage> {
        self.gateway()
            .list()
            .await
            .expect("Failed to list contact messages")
    }

    /// Switch the entity store off (or back on) and drop cached catalog reads.
    pub async fn set_store_unavailable(&self, unavailable: bool) {
        self.store.set_unavailable(unavailable);
        self.state.catalog().invalidate().await;
    }

    fn gateway(&self) -> Gateway {
        Gateway::new(self.store.clone())
    }
}
