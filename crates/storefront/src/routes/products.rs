//! Shop and product detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::models::Product;
use crate::services::catalog::views::{self, RELATED_LIMIT, SHOP_CATEGORIES};
use crate::services::{CatalogError, CategoryFilter};
use crate::state::AppState;

/// One filter tab on the shop page.
#[derive(Clone)]
pub struct CategoryTab {
    pub value: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Shop query parameters.
#[derive(Debug, Deserialize)]
pub struct ShopQuery {
    pub category: Option<String>,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopTemplate {
    pub products: Vec<Product>,
    pub categories: Vec<CategoryTab>,
    pub count_label: String,
    pub unavailable: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: Product,
    pub related_products: Vec<Product>,
}

/// Unknown product page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/not_found.html")]
pub struct ProductNotFoundTemplate {
    pub slug: String,
}

fn category_tabs(selected: &CategoryFilter) -> Vec<CategoryTab> {
    SHOP_CATEGORIES
        .iter()
        .map(|&(value, label)| CategoryTab {
            value,
            label,
            active: selected.as_str() == value,
        })
        .collect()
}

/// Display the shop grid.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<ShopQuery>) -> ShopTemplate {
    let filter = CategoryFilter::parse(query.category.as_deref());

    let (products, unavailable) = match state.catalog().filter_by_category(&filter).await {
        Ok(products) => (products, false),
        Err(e) => {
            warn!(error = %e, "Showing empty shop after failed catalog read");
            (Vec::new(), true)
        }
    };

    ShopTemplate {
        count_label: views::product_count_label(products.len()),
        categories: category_tabs(&filter),
        products,
        unavailable,
    }
}

/// Display a product by slug.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let product = match state.catalog().find_by_slug(&slug).await {
        Ok(product) => product,
        Err(e) => {
            if let CatalogError::Gateway(_) = e {
                warn!(error = %e, "Catalog read failed on product page");
            }
            return (StatusCode::NOT_FOUND, ProductNotFoundTemplate { slug }).into_response();
        }
    };

    let related_products = state
        .catalog()
        .related_to(&product, RELATED_LIMIT)
        .await
        .unwrap_or_default();

    ProductShowTemplate {
        product,
        related_products,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_tabs_mark_active() {
        let tabs = category_tabs(&CategoryFilter::parse(Some("bundles")));
        let active: Vec<_> = tabs.iter().filter(|t| t.active).map(|t| t.label).collect();
        assert_eq!(active, ["Bundles"]);

        let tabs = category_tabs(&CategoryFilter::All);
        assert!(tabs[0].active);
        assert_eq!(tabs[0].label, "All Products");
    }
}
