//! Catalog seed files.
//!
//! ```yaml
//! products:
//!   - name: Starter Kit
//!     slug: starter-kit
//!     price: 45.00
//!     category: kits
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::gateway::{Entity, EntityStore, GatewayError};
use crate::models::{Product, ProductDraft};

/// Errors loading or writing a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to serialize product: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to store product: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    products: Vec<ProductDraft>,
}

/// Parse a YAML seed document.
///
/// # Errors
///
/// Returns an error if the YAML doesn't describe a product list.
pub fn parse_seed(yaml: &str) -> Result<Vec<ProductDraft>, SeedError> {
    let file: SeedFile = serde_yaml::from_str(yaml)?;
    Ok(file.products)
}

/// Read and parse a YAML seed file.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed.
pub fn load_seed_file(path: &Path) -> Result<Vec<ProductDraft>, SeedError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed(&yaml)
}

/// Write `drafts` into `store` as products, skipping slugs already present.
///
/// Returns the number of products created.
///
/// # Errors
///
/// Returns an error on the first failed gateway call.
pub async fn seed_store(
    store: &dyn EntityStore,
    drafts: &[ProductDraft],
) -> Result<usize, SeedError> {
    let existing = store.list(Product::NAME).await?;
    let mut created = 0;

    for draft in drafts {
        let present = existing
            .iter()
            .any(|record| record.get("slug").and_then(|s| s.as_str()) == Some(draft.slug.as_str()));
        if present {
            info!(slug = %draft.slug, "Product already present, skipping");
            continue;
        }

        store
            .create(Product::NAME, serde_json::to_value(draft)?)
            .await?;
        info!(slug = %draft.slug, "Seeded product");
        created += 1;
    }

    Ok(created)
}
