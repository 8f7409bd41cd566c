//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tipsy_tank_core::{Price, ProductId};

use crate::gateway::Entity;
use crate::models::timestamp::optional_timestamp;

/// Slug whose placeholder image stands in for any product without one.
const DEFAULT_PLACEHOLDER_SLUG: &str = "starter-kit";

const PLACEHOLDER_IMAGES: &[(&str, &str)] = &[
    (
        "starter-kit",
        "https://images.unsplash.com/photo-1584464491033-06628f3a6b7b?w=800&h=800&fit=crop",
    ),
    (
        "deluxe-kit",
        "https://images.unsplash.com/photo-1520301255226-bf5f144451c1?w=800&h=800&fit=crop",
    ),
    (
        "maze-extension-kit",
        "https://images.unsplash.com/photo-1544943910-4c1dc44aab44?w=800&h=800&fit=crop",
    ),
    (
        "window-bridge-kit",
        "https://images.unsplash.com/photo-1571752726703-5e7d1f6a986d?w=800&h=800&fit=crop",
    ),
    (
        "ultimate-bundle",
        "https://images.unsplash.com/photo-1559717865-a99cac1c95d8?w=800&h=800&fit=crop",
    ),
];

/// A kit, extension or bundle for sale. Read-only to the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub short_description: String,
    /// Category tag such as `kits`, `extensions` or `bundles`.
    #[serde(default)]
    pub category: String,
    pub slug: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub whats_in_box: Vec<String>,
    #[serde(default)]
    pub perfect_for: Vec<String>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default, deserialize_with = "optional_timestamp")]
    pub created_date: Option<DateTime<Utc>>,
}

impl Product {
    /// Image to show for this product.
    ///
    /// First gallery image, then the single image, then a per-slug
    /// placeholder, then the generic kit placeholder.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.image_urls
            .first()
            .map(String::as_str)
            .filter(|url| !url.is_empty())
            .or_else(|| self.image_url.as_deref().filter(|url| !url.is_empty()))
            .or_else(|| placeholder_image(&self.slug))
            .or_else(|| placeholder_image(DEFAULT_PLACEHOLDER_SLUG))
            .unwrap_or_default()
    }

    /// Human-readable category badge, e.g. `kits` → `kits`, `add-ons` → `add ons`.
    #[must_use]
    pub fn category_label(&self) -> String {
        if self.category.is_empty() {
            "Kit".to_string()
        } else {
            self.category.replacen('-', " ", 1)
        }
    }

    /// Lead paragraph for the detail page.
    #[must_use]
    pub fn lead(&self) -> &str {
        self.intro
            .as_deref()
            .filter(|intro| !intro.is_empty())
            .unwrap_or(&self.short_description)
    }
}

fn placeholder_image(slug: &str) -> Option<&'static str> {
    PLACEHOLDER_IMAGES
        .iter()
        .find(|(key, _)| *key == slug)
        .map(|(_, url)| *url)
}

impl Entity for Product {
    const NAME: &'static str = "Product";
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Product fields as written by operator seeding.
///
/// Not [`crate::gateway::Creatable`]: the storefront never creates products,
/// seeding goes through the raw store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub category: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub whats_in_box: Vec<String>,
    #[serde(default)]
    pub perfect_for: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
}
