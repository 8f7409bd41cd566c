//! Catalog reader.
//!
//! Products are read-only to the storefront. The full list is fetched in one
//! call and cached with `moka`; every view (slug lookup, category filter,
//! related, featured) is derived from that list.

pub mod seed;
pub mod views;

pub use views::{CategoryFilter, FEATURED_LIMIT, RELATED_LIMIT, SHOP_CATEGORIES};

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use tipsy_tank_core::ProductId;

use crate::gateway::{Gateway, GatewayError};
use crate::models::Product;

/// Errors from catalog reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product has the requested slug or id.
    #[error("product not found: {0}")]
    NotFound(String),

    /// Reading products failed.
    #[error("failed to load products: {0}")]
    Gateway(#[from] GatewayError),
}

/// Cached read access to products.
#[derive(Clone)]
pub struct CatalogReader {
    gateway: Gateway,
    cache: Cache<(), Arc<Vec<Product>>>,
}

impl CatalogReader {
    /// Create a reader whose product list lives for `ttl`.
    #[must_use]
    pub fn new(gateway: Gateway, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { gateway, cache }
    }

    /// Every product in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list can't be fetched. Failures are
    /// not cached.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Arc<Vec<Product>>, CatalogError> {
        if let Some(products) = self.cache.get(&()).await {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products = Arc::new(self.gateway.list::<Product>().await?);
        debug!(count = products.len(), "Fetched product list");
        self.cache.insert((), Arc::clone(&products)).await;
        Ok(products)
    }

    /// Drop the cached product list.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }

    /// The product with `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has `slug`.
    #[instrument(skip(self))]
    pub async fn find_by_slug(&self, slug: &str) -> Result<Product, CatalogError> {
        let products = self.list_all().await?;
        views::find_by_slug(&products, slug)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(slug.to_string()))
    }

    /// The product with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has `id`.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn find_by_id(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let products = self.list_all().await?;
        products
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Products in the selected category.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list can't be fetched.
    pub async fn filter_by_category(
        &self,
        filter: &CategoryFilter,
    ) -> Result<Vec<Product>, CatalogError> {
        let products = self.list_all().await?;
        Ok(views::filter_by_category(&products, filter))
    }

    /// Up to `limit` products other than `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list can't be fetched.
    pub async fn related_to(
        &self,
        product: &Product,
        limit: usize,
    ) -> Result<Vec<Product>, CatalogError> {
        let products = self.list_all().await?;
        Ok(views::related_to(&products, product, limit))
    }

    /// The first `limit` products.
    ///
    /// # Errors
    ///
    /// Returns an error if the product list can't be fetched.
    pub async fn featured(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        let products = self.list_all().await?;
        Ok(views::featured(&products, limit))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::{EntityStore, MemoryEntityStore};
    use serde_json::json;

    async fn reader() -> (CatalogReader, Arc<MemoryEntityStore>) {
        let store = Arc::new(MemoryEntityStore::new());
        for (slug, category) in [
            ("starter-kit", "kits"),
            ("deluxe-kit", "kits"),
            ("maze-extension-kit", "extensions"),
        ] {
            store
                .create(
                    "Product",
                    json!({"name": slug, "slug": slug, "price": 30, "category": category}),
                )
                .await
                .unwrap();
        }
        let reader = CatalogReader::new(Gateway::new(store.clone()), Duration::from_secs(60));
        (reader, store)
    }

    #[tokio::test]
    async fn test_find_by_slug_miss_is_not_found() {
        let (catalog, _) = reader().await;
        assert!(matches!(
            catalog.find_by_slug("no-such-kit").await,
            Err(CatalogError::NotFound(slug)) if slug == "no-such-kit"
        ));
        assert_eq!(
            catalog.find_by_slug("deluxe-kit").await.unwrap().slug,
            "deluxe-kit"
        );
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let (catalog, _) = reader().await;
        let kit = catalog.find_by_slug("starter-kit").await.unwrap();
        assert_eq!(catalog.find_by_id(&kit.id).await.unwrap(), kit);
        assert!(matches!(
            catalog.find_by_id(&ProductId::new("nope")).await,
            Err(CatalogError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let (catalog, store) = reader().await;
        assert_eq!(catalog.list_all().await.unwrap().len(), 3);

        store
            .create(
                "Product",
                json!({"name": "Bundle", "slug": "ultimate-bundle", "price": 99}),
            )
            .await
            .unwrap();
        assert_eq!(catalog.list_all().await.unwrap().len(), 3);

        catalog.invalidate().await;
        assert_eq!(catalog.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let (catalog, store) = reader().await;
        store.set_unavailable(true);
        assert!(matches!(
            catalog.list_all().await,
            Err(CatalogError::Gateway(GatewayError::Unavailable(_)))
        ));

        store.set_unavailable(false);
        assert_eq!(catalog.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_category_and_related() {
        let (catalog, _) = reader().await;
        let kits = catalog
            .filter_by_category(&CategoryFilter::parse(Some("kits")))
            .await
            .unwrap();
        assert_eq!(kits.len(), 2);

        let kit = catalog.find_by_slug("starter-kit").await.unwrap();
        let related = catalog.related_to(&kit, RELATED_LIMIT).await.unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|p| p.id != kit.id));

        assert_eq!(catalog.featured(FEATURED_LIMIT).await.unwrap().len(), 3);
    }
}
