//! Seed the hosted entity store with catalog products.
//!
//! Products are matched by slug; ones already present are left untouched, so
//! the command can be re-run after editing the catalog file.

use std::path::Path;

use tracing::info;

use tipsy_tank_storefront::config::EntityStoreConfig;
use tipsy_tank_storefront::gateway::HttpEntityStore;
use tipsy_tank_storefront::services::catalog::seed::{load_seed_file, seed_store};

/// Seed products from a YAML file.
///
/// # Arguments
///
/// * `file` - Catalog YAML file
/// * `dry_run` - Only parse and report; no API calls
///
/// # Errors
///
/// Returns an error if the file can't be parsed, the entity API isn't
/// configured, or a create call fails.
pub async fn products(file: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let drafts = load_seed_file(file)?;
    info!(path = %file.display(), products = drafts.len(), "Parsed catalog file");

    if dry_run {
        for draft in &drafts {
            info!(slug = %draft.slug, name = %draft.name, price = %draft.price, "Would seed");
        }
        return Ok(());
    }

    let EntityStoreConfig::Remote(api) = EntityStoreConfig::from_env()? else {
        return Err(
            "ENTITY_API_URL, ENTITY_APP_ID and ENTITY_API_KEY must be set to seed the hosted store"
                .into(),
        );
    };

    let store = HttpEntityStore::new(&api)?;
    let created = seed_store(&store, &drafts).await?;

    info!(
        created,
        skipped = drafts.len().saturating_sub(created),
        "Catalog seeding complete"
    );
    Ok(())
}
