//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Landing page (CMS sections, product, cart)
//! GET  /health            - Health check
//!
//! # Product (HTMX fragments)
//! GET  /product           - Product display (?variant=<id>)
//! GET  /product/button    - Add-to-cart button at rest (?variant=<gid>)
//!
//! # Cart (HTMX fragments)
//! GET  /cart              - Drawer contents
//! GET  /cart/count        - Badge
//! POST /cart/add          - Add variant (button + OOB badge and drawer)
//! POST /cart/update       - Change quantity (drawer + OOB badge)
//! POST /cart/remove       - Remove line (drawer + OOB badge)
//!
//! # Checkout
//! GET  /checkout          - Redirect to the cart permalink
//!
//! # Analytics
//! POST /analytics/ready   - Consent known; flush deferred page view
//! ```

pub mod analytics;
pub mod cart;
pub mod home;
pub mod product;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(product::show))
        .route("/button", get(product::button))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(home::health))
        .nest("/product", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout))
        .route("/analytics/ready", post(analytics::ready))
}
