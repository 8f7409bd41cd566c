//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (hero + featured products)
//! GET  /shop?category=…        - Product grid with category filter
//! GET  /products/{slug}        - Product detail (+ related), 404 page if unknown
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns badge + notice, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment + notice)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/events            - Server-sent cart-updated events
//!
//! # Contact
//! GET  /contact                - Contact form
//! POST /contact                - Submit message
//!
//! # Static pages
//! GET  /about, /faq, /how-it-works
//! ```

pub mod cart;
pub mod contact;
pub mod events;
pub mod home;
pub mod pages;
pub mod products;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Response},
    routing::{get, post},
};

use crate::state::AppState;

/// Event name shared by the `HX-Trigger` header and the SSE stream.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Returns true if the request was issued by HTMX.
#[must_use]
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get("HX-Request")
        .is_some_and(|value| value.as_bytes() == b"true")
}

/// Dismissible notice fragment (HTMX), swapped into `#notices`.
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub title: String,
    pub message: String,
    pub is_error: bool,
}

/// Success notice carried next to a fragment and swapped out-of-band into
/// `#notices` (`partials/notice_oob.html`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Render an error notice retargeted at the page's notice area.
#[must_use]
pub fn error_notice(status: StatusCode, title: &str, message: &str) -> Response {
    (
        status,
        AppendHeaders([("HX-Retarget", "#notices"), ("HX-Reswap", "innerHTML")]),
        NoticeTemplate {
            title: title.to_string(),
            message: message.to_string(),
            is_error: true,
        },
    )
        .into_response()
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/events", get(events::cart_events))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .route("/shop", get(products::index))
        .route("/products/{slug}", get(products::show))
        // Cart routes
        .nest("/cart", cart_routes())
        // Contact
        .route("/contact", get(contact::show).post(contact::submit))
        // Static pages
        .route("/about", get(pages::about))
        .route("/faq", get(pages::faq))
        .route("/how-it-works", get(pages::how_it_works))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_is_htmx() {
        let mut headers = HeaderMap::new();
        assert!(!is_htmx(&headers));
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        assert!(is_htmx(&headers));
    }

    #[test]
    fn test_error_notice_retargets() {
        let response = error_notice(StatusCode::BAD_GATEWAY, "Oops!", "Try again.");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers().get("HX-Retarget").unwrap(), "#notices");
    }
}
