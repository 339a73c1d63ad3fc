//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span with a `request_id` field)
//! 3. Request ID (reuse or mint `x-request-id`)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
