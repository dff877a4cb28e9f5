//! HTTP middleware stack for the API server.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, one hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS
//!
//! Authentication is not a layer: handlers that care take a
//! [`BearerIdentity`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{BearerIdentity, bearer_token};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
