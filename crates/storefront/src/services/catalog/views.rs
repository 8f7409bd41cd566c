//! Derived catalog views over an already-fetched product list.

use crate::models::Product;

/// Products shown on the home page.
pub const FEATURED_LIMIT: usize = 4;

/// "You may also like" products on a detail page.
pub const RELATED_LIMIT: usize = 3;

/// Shop filter tabs as (query value, label).
pub const SHOP_CATEGORIES: &[(&str, &str)] = &[
    ("all", "All Products"),
    ("kits", "Kits"),
    ("extensions", "Extensions"),
    ("bundles", "Bundles"),
];

/// Category selection on the shop page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// Parse the `category` query value; empty or `all` means no filter.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(tag) => Self::Only(tag.to_string()),
        }
    }

    /// Query value for links and tab highlighting.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Only(tag) => tag,
        }
    }

    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Only(tag) => product.category == *tag,
        }
    }
}

/// First product with `slug`.
#[must_use]
pub fn find_by_slug<'a>(products: &'a [Product], slug: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.slug == slug)
}

/// Products in `filter`, catalog order preserved.
#[must_use]
pub fn filter_by_category(products: &[Product], filter: &CategoryFilter) -> Vec<Product> {
    products
        .iter()
        .filter(|p| filter.matches(p))
        .cloned()
        .collect()
}

/// Up to `limit` other products, catalog order preserved.
#[must_use]
pub fn related_to(products: &[Product], product: &Product, limit: usize) -> Vec<Product> {
    products
        .iter()
        .filter(|p| p.id != product.id)
        .take(limit)
        .cloned()
        .collect()
}

/// The first `limit` products.
#[must_use]
pub fn featured(products: &[Product], limit: usize) -> Vec<Product> {
    products.iter().take(limit).cloned().collect()
}

/// "5 products" / "1 product".
#[must_use]
pub fn product_count_label(count: usize) -> String {
    if count == 1 {
        "1 product".to_string()
    } else {
        format!("{count} products")
    }
}
