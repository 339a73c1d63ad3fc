//! Cart route handlers.
//!
//! Every handler mounts a [`CartStore`] for the visitor's cookie, applies
//! the operation, and renders from the store's settled state. Mutations
//! answer with the changed fragments plus out-of-band badge and drawer
//! swaps, and report page events in `HX-Trigger`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use funnels_core::CartLineId;
use serde::Deserialize;
use tracing::{instrument, warn};

use super::product::button_item;
use crate::cart::{
    AddToCartButton, ButtonState, CartStore, CartView, DrawerState, change_quantity,
    checkout_target,
};
use crate::cookies::CookieJar;
use crate::error::AppError;
use crate::events::{EventBus, PageEvent};
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<i64>,
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

/// Cart drawer fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/drawer.html")]
pub struct DrawerTemplate {
    pub cart: CartView,
    pub drawer_open: bool,
    pub drawer_oob: bool,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/badge.html")]
pub struct BadgeTemplate {
    pub cart: CartView,
    pub badge_oob: bool,
}

/// Add-to-cart response: the button plus out-of-band badge and drawer.
#[derive(Template, WebTemplate)]
#[template(path = "partials/added.html")]
pub struct AddedTemplate {
    pub variant_gid: String,
    pub button: ButtonState,
    pub cart: CartView,
    pub drawer_open: bool,
}

/// Quantity change response: the drawer plus an out-of-band badge.
#[derive(Template, WebTemplate)]
#[template(path = "partials/drawer_update.html")]
pub struct DrawerUpdateTemplate {
    pub cart: CartView,
    pub drawer_open: bool,
}

async fn mounted_store(state: &AppState, jar: &CookieJar) -> CartStore {
    let store = state.cart_store(jar);
    store.mount().await;
    store
}

/// Render the drawer contents.
#[instrument(skip_all)]
pub async fn show(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let store = mounted_store(&state, &jar).await;
    let cart = CartView::from(&store.state());
    (
        jar,
        DrawerTemplate {
            cart,
            drawer_open: false,
            drawer_oob: false,
        },
    )
}

/// Render the item count badge.
#[instrument(skip_all)]
pub async fn count(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let store = mounted_store(&state, &jar).await;
    let cart = CartView::from(&store.state());
    (
        jar,
        BadgeTemplate {
            cart,
            badge_oob: false,
        },
    )
}

/// Add a variant to the cart, creating the cart on first use.
#[instrument(skip(state, jar, headers))]
pub async fn add(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let Some(mut item) = button_item(state.product(), &form.variant_id) else {
        return AppError::BadRequest(format!("Unknown variant: {}", form.variant_id))
            .into_response();
    };
    item.quantity = form.quantity.unwrap_or(1).max(1);

    let store = mounted_store(&state, &jar).await;
    let analytics = state.analytics_context(&jar, &headers);
    let events = EventBus::new();
    let button = AddToCartButton::new(item);

    if button.click(&store, &events, &analytics).await.is_none() {
        warn!(variant = %form.variant_id, "Add to cart ignored for unavailable variant");
    }

    let drawer = DrawerState::after(&events.emitted());
    let template = AddedTemplate {
        variant_gid: form.variant_id,
        button: button.state(),
        cart: CartView::from(&store.state()),
        drawer_open: drawer.open,
    };
    (jar, events, template).into_response()
}

/// Change a line's quantity; below 1 removes it.
///
/// The mutation is sent even when the line is missing from the loaded
/// cart; only the add-to-cart analytics needs the old quantity.
#[instrument(skip(state, jar, headers))]
pub async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let store = mounted_store(&state, &jar).await;
    let events = EventBus::new();
    let line_id = CartLineId::new(form.line_id);

    let line = store
        .state()
        .cart
        .and_then(|cart| cart.line(&line_id).cloned());

    let response = match line {
        Some(line) => {
            let analytics = state.analytics_context(&jar, &headers);
            change_quantity(&store, &analytics, &line, form.quantity).await
        }
        None => {
            warn!(line = %line_id, "Line not in the loaded cart; updating without analytics");
            store.update_quantity(&line_id, form.quantity).await
        }
    };
    if response.success {
        events.emit(PageEvent::CartUpdated(response.cart.map(Box::new)));
    }

    drawer_response(jar, events, &store)
}

/// Remove a line.
#[instrument(skip(state, jar))]
pub async fn remove(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let store = mounted_store(&state, &jar).await;
    let events = EventBus::new();

    let response = store
        .remove_from_cart(&CartLineId::new(form.line_id))
        .await;
    if response.success {
        events.emit(PageEvent::CartUpdated(response.cart.map(Box::new)));
    }

    drawer_response(jar, events, &store)
}

fn drawer_response(jar: CookieJar, events: EventBus, store: &CartStore) -> Response {
    let template = DrawerUpdateTemplate {
        cart: CartView::from(&store.state()),
        drawer_open: true,
    };
    (jar, events, template).into_response()
}

/// Send the visitor to checkout through the cart permalink.
///
/// An empty or missing cart goes back to the landing page.
#[instrument(skip_all)]
pub async fn checkout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let store = mounted_store(&state, &jar).await;
    let target = store
        .state()
        .cart
        .and_then(|cart| checkout_target(&store, &cart));

    match target {
        Some(url) => (jar, Redirect::to(&url)).into_response(),
        None => (jar, Redirect::to("/")).into_response(),
    }
}
