//! Request correlation IDs.
//!
//! Each request carries an `x-request-id`: the upstream proxy's value when
//! present and well-formed, a fresh UUID v4 otherwise. The ID is recorded on
//! the request span (see [`request_span`]), tagged on the Sentry scope, made
//! available to handlers as a [`RequestId`] extension and echoed in the
//! response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::{Span, field};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted as-is.
const MAX_UPSTREAM_ID_LEN: usize = 128;

/// The current request's correlation ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

fn upstream_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
        .map(String::from)
}

/// Span for one HTTP request, with an empty `request_id` field for
/// [`request_id_middleware`] to fill in.
///
/// Used as the trace layer's span factory; a span without the field
/// silently drops the recorded ID.
pub fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
        request_id = field::Empty,
    )
}

/// Middleware that ensures every request has a correlation ID.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
