//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>` when
//! they have no page-specific way to degrade.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::services::{CartError, CatalogError, ContactError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entity API operation failed.
    #[error("Entity store error: {0}")]
    Gateway(#[from] GatewayError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog read failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Contact submission failed.
    #[error("Contact error: {0}")]
    Contact(#[from] ContactError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code sent to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(_)
            | Self::Contact(_)
            | Self::Catalog(CatalogError::Gateway(_))
            | Self::Cart(CartError::Read(_) | CartError::Write(_)) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_)
            | Self::Catalog(CatalogError::NotFound(_))
            | Self::Cart(CartError::LineNotFound(_)) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Cart(CartError::InvalidQuantity(_)) => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Message safe to show a visitor.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            Self::Gateway(_) | Self::Catalog(CatalogError::Gateway(_)) => {
                "External service error".to_string()
            }
            Self::Cart(CartError::Read(_)) => "Could not load your cart.".to_string(),
            Self::Cart(CartError::Write(_)) => {
                "Could not update your cart. Please try again.".to_string()
            }
            Self::Cart(CartError::LineNotFound(_)) => "That item is no longer in your cart.".to_string(),
            Self::Cart(CartError::InvalidQuantity(_)) => "Please choose a valid quantity.".to_string(),
            Self::Catalog(CatalogError::NotFound(_)) => "Product not found".to_string(),
            Self::Contact(_) => "Failed to send message. Please try again.".to_string(),
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }

    /// Whether this error is a server-side failure worth reporting.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tipsy_tank_core::CartItemId;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::LineNotFound(CartItemId::new("x")))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::InvalidQuantity(-1))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Cart(CartError::Write(GatewayError::Unavailable(
                "down".to_string()
            )))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::Catalog(CatalogError::NotFound("kit".to_string()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = AppError::Gateway(GatewayError::Api {
            status: 500,
            message: "stack trace at line 42".to_string(),
        });
        assert!(!err.public_message().contains("stack trace"));
    }
}
