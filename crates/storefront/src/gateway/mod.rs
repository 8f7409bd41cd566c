//! Remote entity gateway.
//!
//! # Architecture
//!
//! - The hosted entity store is the source of truth for products, cart lines
//!   and contact messages - NO local sync, direct API calls
//! - [`EntityStore`] is the object-safe backend contract and deals in raw JSON
//!   records; [`HttpEntityStore`] talks to the hosted API and
//!   [`MemoryEntityStore`] keeps records in process (local development, tests)
//! - [`Gateway`] is the typed facade the services use. Capability traits
//!   ([`Creatable`], [`Updatable`], [`Deletable`]) decide at compile time which
//!   operations an entity type allows, so products stay read-only and contact
//!   messages stay create-only
//!
//! # Example
//!
//! ```rust,ignore
//! let gateway = Gateway::new(Arc::new(MemoryEntityStore::new()));
//!
//! let lines: Vec<CartItem> = gateway
//!     .filter(&Filter::new().eq("session_id", token.as_str()))
//!     .await?;
//! ```

pub mod http;
pub mod memory;

pub use http::HttpEntityStore;
pub use memory::MemoryEntityStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{instrument, warn};

/// Errors that can occur when talking to the entity store.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Request or response body could not be (de)serialized.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The addressed record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the entity API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend is switched off or unreachable.
    #[error("Entity store unavailable: {0}")]
    Unavailable(String),
}

/// Field-equality filter, e.g. `{"session_id": "…", "product_id": "…"}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    /// An empty filter matching every record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_owned(), value.into());
        self
    }

    /// Returns true if every constrained field of `record` equals the filter value.
    #[must_use]
    pub fn matches(&self, record: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| record.get(field) == Some(expected))
    }

    /// The filter as a JSON object (the hosted API's `q` parameter).
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    /// Returns true if the filter has no constraints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Backend contract for a generic per-entity-type record store.
///
/// Records are JSON objects carrying a server-assigned string `id`.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Short name of the backend for logs.
    fn backend_tag(&self) -> &'static str;

    /// All records of `entity`, in store order.
    async fn list(&self, entity: &str) -> Result<Vec<Value>, GatewayError>;

    /// Records of `entity` matching `filter`, in store order.
    async fn filter(&self, entity: &str, filter: &Filter) -> Result<Vec<Value>, GatewayError>;

    /// Create a record; the store assigns its `id`.
    async fn create(&self, entity: &str, fields: Value) -> Result<Value, GatewayError>;

    /// Merge `patch` into the record with `id`.
    async fn update(&self, entity: &str, id: &str, patch: Value) -> Result<Value, GatewayError>;

    /// Delete the record with `id`.
    async fn delete(&self, entity: &str, id: &str) -> Result<(), GatewayError>;
}

/// A typed record stored in the entity store.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    /// Entity type name as known by the store (e.g. `CartItem`).
    const NAME: &'static str;

    /// Identifier type.
    type Id: AsRef<str> + Send + Sync;

    /// This record's identifier.
    fn id(&self) -> &Self::Id;
}

/// Entities the storefront may create.
pub trait Creatable: Entity {
    /// Fields sent on creation (everything but server-assigned ones).
    type Draft: Serialize + Send + Sync;
}

/// Entities the storefront may partially update.
pub trait Updatable: Entity {
    /// Partial field set sent on update.
    type Patch: Serialize + Send + Sync;
}

/// Entities the storefront may delete.
pub trait Deletable: Entity {}

/// Typed facade over an [`EntityStore`].
///
/// Cheap to clone; all clones share the same backend.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn EntityStore>,
}

impl Gateway {
    /// Wrap a backend.
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// The raw backend, for operator tooling that works below the typed layer.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn EntityStore> {
        &self.store
    }

    /// Short name of the backend for logs.
    #[must_use]
    pub fn backend_tag(&self) -> &'static str {
        self.store.backend_tag()
    }

    /// Read every record of `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self), fields(entity = E::NAME, backend = self.backend_tag()))]
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>, GatewayError> {
        let records = self.store.list(E::NAME).await?;
        Ok(decode_records(records))
    }

    /// Read the records of `E` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, filter), fields(entity = E::NAME, backend = self.backend_tag()))]
    pub async fn filter<E: Entity>(&self, filter: &Filter) -> Result<Vec<E>, GatewayError> {
        let records = self.store.filter(E::NAME, filter).await?;
        Ok(decode_records(records))
    }

    /// Create a record of `E`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails or the stored record can't be decoded.
    #[instrument(skip(self, draft), fields(entity = E::NAME, backend = self.backend_tag()))]
    pub async fn create<E: Creatable>(&self, draft: &E::Draft) -> Result<E, GatewayError> {
        let fields = serde_json::to_value(draft)?;
        let record = self.store.create(E::NAME, fields).await?;
        Ok(serde_json::from_value(record)?)
    }

    /// Partially update the record of `E` with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails or the stored record can't be decoded.
    #[instrument(skip(self, id, patch), fields(entity = E::NAME, id = id.as_ref()))]
    pub async fn update<E: Updatable>(
        &self,
        id: &E::Id,
        patch: &E::Patch,
    ) -> Result<E, GatewayError> {
        let patch = serde_json::to_value(patch)?;
        let record = self.store.update(E::NAME, id.as_ref(), patch).await?;
        Ok(serde_json::from_value(record)?)
    }

    /// Delete the record of `E` with `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend call fails.
    #[instrument(skip(self, id), fields(entity = E::NAME, id = id.as_ref()))]
    pub async fn delete<E: Deletable>(&self, id: &E::Id) -> Result<(), GatewayError> {
        self.store.delete(E::NAME, id.as_ref()).await
    }
}

/// Decode raw records, skipping (and logging) any that don't fit the type.
fn decode_records<E: Entity>(records: Vec<Value>) -> Vec<E> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value::<E>(record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!(entity = E::NAME, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}
