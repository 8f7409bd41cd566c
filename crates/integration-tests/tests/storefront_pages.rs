//! Integration tests for catalog and content pages.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;

use tipsy_tank_integration_tests::TestApp;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    assert_eq!(app.get("/health/ready").await.status(), StatusCode::OK);

    app.set_store_unavailable(true).await;
    assert_eq!(
        app.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_home_page_shows_featured_products() {
    let app = TestApp::spawn().await;

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();

    assert!(body.contains("Build an Aquarium From Your"));
    assert!(body.contains("/products/starter-kit"));
    assert!(body.contains("/products/window-bridge-kit"));
    // Only the first four products are featured.
    assert!(!body.contains("/products/ultimate-bundle"));
}

#[tokio::test]
async fn test_home_page_survives_store_outage() {
    let app = TestApp::spawn().await;
    app.set_store_unavailable(true).await;

    let resp = app.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("restocking"));
}

#[tokio::test]
async fn test_shop_lists_all_products() {
    let app = TestApp::spawn().await;

    let body = app.get_text("/shop").await;
    assert!(body.contains("5 products"));
    for slug in [
        "starter-kit",
        "deluxe-kit",
        "maze-extension-kit",
        "window-bridge-kit",
        "ultimate-bundle",
    ] {
        assert!(body.contains(&format!("/products/{slug}")), "missing {slug}");
    }
}

#[tokio::test]
async fn test_shop_category_filter() {
    let app = TestApp::spawn().await;

    let body = app.get_text("/shop?category=extensions").await;
    assert!(body.contains("2 products"));
    assert!(body.contains("/products/maze-extension-kit"));
    assert!(!body.contains("/products/starter-kit"));

    let body = app.get_text("/shop?category=bundles").await;
    assert!(body.contains("1 product<"));

    let body = app.get_text("/shop?category=gift-cards").await;
    assert!(body.contains("0 products"));
    assert!(body.contains("No products found in this category."));
}

#[tokio::test]
async fn test_shop_shows_notice_when_store_is_down() {
    let app = TestApp::spawn().await;
    app.set_store_unavailable(true).await;

    let resp = app.get("/shop").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("0 products"));
    assert!(body.contains("couldn't load our kits"));
}

#[tokio::test]
async fn test_product_page_with_related_products() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products/starter-kit").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();

    assert!(body.contains("Starter Kit"));
    assert!(body.contains("$45.00"));
    assert!(body.contains("Precision glass cutter"));
    assert!(body.contains("You May Also Like"));
    // The first three other products.
    assert!(body.contains("/products/deluxe-kit"));
    assert!(body.contains("/products/window-bridge-kit"));
    assert!(!body.contains("/products/ultimate-bundle"));
}

#[tokio::test]
async fn test_unknown_product_is_404_page() {
    let app = TestApp::spawn().await;

    let resp = app.get("/products/does-not-exist").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Product not found"));
    assert!(body.contains("href=\"/shop\""));
}

#[tokio::test]
async fn test_static_pages_render() {
    let app = TestApp::spawn().await;

    let about = app.get_text("/about").await;
    assert!(about.contains("Sustainability"));

    let faq = app.get_text("/faq").await;
    assert!(faq.contains("Is this safe for real fish?"));

    let how = app.get_text("/how-it-works").await;
    assert!(how.contains("Choose Your Bottle"));
    assert!(how.contains("Extend It"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::spawn().await;
    assert_eq!(
        app.get("/no/such/page").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_static_assets_and_request_id() {
    let app = TestApp::spawn().await;

    let resp = app.get("/static/css/main.css").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}
