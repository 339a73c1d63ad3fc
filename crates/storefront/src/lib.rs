//! Funnels storefront library.
//!
//! A single-product landing page: CMS-driven sections, a product with
//! variant selection, and a Shopify cart kept in a cookie. Exposed as a
//! library so the binary, the CLI and integration tests share it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod cms;
pub mod config;
pub mod cookies;
pub mod error;
pub mod events;
pub mod filters;
pub mod middleware;
pub mod product;
pub mod routes;
pub mod shopify;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the application router with its middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::extract::Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
