//! Catalog inspection.

use tipsy_tank_storefront::build_gateway;
use tipsy_tank_storefront::config::EntityStoreConfig;
use tipsy_tank_storefront::models::Product;
use tipsy_tank_storefront::services::CategoryFilter;
use tipsy_tank_storefront::services::catalog::views;

/// Print products from the configured entity store.
///
/// Without the entity API variables this lists the in-memory catalog the
/// storefront would start with.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the read fails.
pub async fn list(category: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = EntityStoreConfig::from_env()?;
    let gateway = build_gateway(&config).await?;

    let filter = CategoryFilter::parse(category);
    let products: Vec<Product> = gateway.list().await?;
    let products = views::filter_by_category(&products, &filter);

    #[allow(clippy::print_stdout)]
    {
        for product in &products {
            println!(
                "{:<24} {:<32} {:>9}  {}",
                product.slug,
                product.name,
                product.price.to_string(),
                product.category_label()
            );
        }
        println!("{}", views::product_count_label(products.len()));
    }

    Ok(())
}
