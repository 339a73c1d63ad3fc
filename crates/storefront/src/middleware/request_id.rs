//! Request ID middleware for log and error correlation.
//!
//! An upstream `x-request-id` is reused; otherwise a UUID v4 is minted. The
//! id is recorded on the request span, tagged in Sentry, stored as a
//! [`RequestId`] extension, and echoed in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The id assigned to the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_request(request: &Request) -> Self {
        let id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .filter(|h| !h.is_empty())
            .map_or_else(|| Uuid::new_v4().to_string(), String::from);
        Self(id)
    }
}

/// Ensure every request carries a request id.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);

    Span::current().record("request_id", request_id.0.as_str());
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id.0);
    });

    let header = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
