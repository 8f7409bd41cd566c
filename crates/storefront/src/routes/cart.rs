//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every successful mutation answers with `HX-Trigger: cart-updated` so the
//! header badge refreshes; other open tabs hear about it over `/cart/events`.
//! Plain form posts (no JavaScript) are redirected back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{error, instrument, warn};

use tipsy_tank_core::{CartItemId, ProductId};

use crate::error::add_breadcrumb;
use crate::routes::{CART_UPDATED_EVENT, Notice, error_notice, is_htmx};
use crate::services::cart::{FLAT_SHIPPING_FEE, FREE_SHIPPING_THRESHOLD};
use crate::services::session::{existing_session_token, get_or_create_session_token};
use crate::services::{CartError, CartView, CatalogError};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub shipping_note: String,
    pub notice: Option<Notice>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub notice: Option<Notice>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
    pub notice: Option<Notice>,
}

/// Free-shipping copy shared by the cart templates.
#[must_use]
pub fn shipping_note() -> String {
    format!("Free shipping on orders over {FREE_SHIPPING_THRESHOLD}, otherwise {FLAT_SHIPPING_FEE}.")
}

fn added_notice(product_name: &str) -> Notice {
    Notice::new(
        "Added to cart!",
        format!("{product_name} has been added to your cart."),
    )
}

fn removed_notice() -> Notice {
    Notice::new("Item removed", "The item has been removed from your cart.")
}

/// Response for a failed cart mutation.
fn cart_error_response(err: &CartError) -> Response {
    match err {
        CartError::LineNotFound(_) => error_notice(
            StatusCode::NOT_FOUND,
            "Oops!",
            "That item is no longer in your cart.",
        ),
        CartError::InvalidQuantity(_) => error_notice(
            StatusCode::BAD_REQUEST,
            "Oops!",
            "Please choose a valid quantity.",
        ),
        CartError::Read(_) | CartError::Write(_) => {
            let event_id = sentry::capture_error(err);
            error!(error = %err, sentry_event_id = %event_id, "Cart update failed");
            error_notice(
                StatusCode::BAD_GATEWAY,
                "Oops!",
                "Could not update your cart. Please try again.",
            )
        }
    }
}

/// Answer a successful mutation with `fragment` (HTMX) or a redirect.
fn mutation_response(headers: &HeaderMap, fragment: impl IntoResponse) -> Response {
    if is_htmx(headers) {
        (AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]), fragment).into_response()
    } else {
        Redirect::to("/cart").into_response()
    }
}

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> CartShowTemplate {
    let token = existing_session_token(&session).await;
    let cart = state.cart().view(token.as_ref()).await;
    CartShowTemplate {
        cart,
        shipping_note: shipping_note(),
        notice: None,
    }
}

/// Add item to cart (HTMX).
///
/// Creates the visitor's token on first use. Returns the refreshed badge and
/// an "added" notice.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product_id = ProductId::new(form.product_id);
    let product = match state.catalog().find_by_id(&product_id).await {
        Ok(product) => product,
        Err(CatalogError::NotFound(_)) => {
            return error_notice(
                StatusCode::NOT_FOUND,
                "Oops!",
                "That product is no longer available.",
            );
        }
        Err(e) => {
            error!(error = %e, "Catalog read failed while adding to cart");
            return error_notice(
                StatusCode::BAD_GATEWAY,
                "Oops!",
                "Could not add to cart. Please try again.",
            );
        }
    };

    let token = get_or_create_session_token(&session).await;
    match state.cart().add_or_increment(&token, &product).await {
        Ok(_) => {
            add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product.id.as_str())]));
            let count = state.cart().item_count(&token).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to refresh cart count");
                0
            });
            let notice = Some(added_notice(&product.name));
            mutation_response(&headers, CartCountTemplate { count, notice })
        }
        Err(CartError::Write(e)) => {
            let event_id = sentry::capture_error(&e);
            error!(error = %e, sentry_event_id = %event_id, "Failed to add item to cart");
            error_notice(
                StatusCode::BAD_GATEWAY,
                "Oops!",
                "Could not add to cart. Please try again.",
            )
        }
        Err(e) => cart_error_response(&e),
    }
}

/// Update cart item quantity (HTMX). Zero or less removes the line.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let Some(token) = existing_session_token(&session).await else {
        return cart_error_response(&CartError::LineNotFound(CartItemId::new(form.line_id)));
    };

    let line_id = CartItemId::new(form.line_id);
    match state
        .cart()
        .set_quantity(&token, &line_id, form.quantity)
        .await
    {
        Ok(_) => {
            let cart = state.cart().view(Some(&token)).await;
            mutation_response(&headers, CartItemsTemplate { cart, notice: None })
        }
        Err(e) => cart_error_response(&e),
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let Some(token) = existing_session_token(&session).await else {
        return cart_error_response(&CartError::LineNotFound(CartItemId::new(form.line_id)));
    };

    let line_id = CartItemId::new(form.line_id);
    match state.cart().remove(&token, &line_id).await {
        Ok(()) => {
            let cart = state.cart().view(Some(&token)).await;
            let notice = Some(removed_notice());
            mutation_response(&headers, CartItemsTemplate { cart, notice })
        }
        Err(e) => cart_error_response(&e),
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> CartCountTemplate {
    let count = match existing_session_token(&session).await {
        Some(token) => state.cart().item_count(&token).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load cart count");
            0
        }),
        None => 0,
    };

    CartCountTemplate {
        count,
        notice: None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_shipping_note() {
        assert_eq!(
            shipping_note(),
            "Free shipping on orders over $75.00, otherwise $9.99."
        );
    }

    #[test]
    fn test_plain_form_post_redirects_to_cart() {
        let response = mutation_response(&HeaderMap::new(), "fragment");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_htmx_post_gets_trigger_header() {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Request", HeaderValue::from_static("true"));
        let response = mutation_response(&headers, "fragment");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("HX-Trigger").map(HeaderValue::as_bytes),
            Some(CART_UPDATED_EVENT.as_bytes())
        );
    }

    #[test]
    fn test_added_badge_carries_out_of_band_notice() {
        let html = CartCountTemplate {
            count: 2,
            notice: Some(added_notice("Starter Kit")),
        }
        .render()
        .unwrap();
        assert!(html.contains(r#"id="cart-count""#));
        assert!(html.contains(r#"<div id="notices" hx-swap-oob="innerHTML">"#));
        assert!(html.contains("Added to cart!"));
        assert!(html.contains("Starter Kit has been added to your cart."));
    }

    #[test]
    fn test_plain_badge_has_no_notice() {
        let html = CartCountTemplate {
            count: 2,
            notice: None,
        }
        .render()
        .unwrap();
        assert!(!html.contains("hx-swap-oob"));
    }

    #[test]
    fn test_removed_fragment_carries_notice() {
        let cart = CartView {
            items: Vec::new(),
            totals: crate::services::cart::compute_totals(&[]),
            degraded: false,
        };
        let html = CartItemsTemplate {
            cart,
            notice: Some(removed_notice()),
        }
        .render()
        .unwrap();
        assert!(html.contains("Your cart is empty"));
        assert!(html.contains(r#"hx-swap-oob="innerHTML""#));
        assert!(html.contains("Item removed"));
    }

    #[test]
    fn test_line_not_found_is_404_notice() {
        let response = cart_error_response(&CartError::LineNotFound(CartItemId::new("x")));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
