//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing, span from [`request_span`])
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions, `PostgreSQL` or in-memory store)

pub mod request_id;
pub mod session;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware, request_span};
pub use session::create_session_layer;
