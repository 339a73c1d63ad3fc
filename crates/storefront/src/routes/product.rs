//! Product display fragments.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use funnels_core::{ProductData, VariantGid};
use serde::Deserialize;
use tracing::instrument;

use crate::cart::{ButtonItem, ButtonState};
use crate::product::{NO_PRODUCT, NO_VARIANTS, ProductView};
use crate::state::AppState;

/// `?variant=` selection, by numeric id or GID.
#[derive(Debug, Default, Deserialize)]
pub struct VariantQuery {
    pub variant: Option<String>,
}

/// Product fragment template (for HTMX variant switching).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product.html")]
pub struct ProductTemplate {
    pub product: Option<ProductView>,
    pub product_message: Option<&'static str>,
}

/// Add-to-cart button fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/button.html")]
pub struct ButtonTemplate {
    pub variant_gid: String,
    pub button: ButtonState,
}

/// The product view for `variant`, or the message shown in its place.
#[must_use]
pub fn product_view(
    product: Option<&ProductData>,
    variant: Option<&str>,
) -> (Option<ProductView>, Option<&'static str>) {
    match product {
        None => (None, Some(NO_PRODUCT)),
        Some(product) => match ProductView::build(product, variant) {
            Some(view) => (Some(view), None),
            None => (None, Some(NO_VARIANTS)),
        },
    }
}

/// The button item for `variant`.
///
/// Variants of the landing page product carry full product details; any
/// other GID becomes a bare item.
#[must_use]
pub fn button_item(product: Option<&ProductData>, variant: &str) -> Option<ButtonItem> {
    let known = product.and_then(|product| {
        product
            .variants
            .iter()
            .find(|v| v.id == variant || v.gid.as_str() == variant)
            .map(|v| ButtonItem::from_variant(product, v))
    });

    known.or_else(|| {
        variant
            .starts_with("gid://shopify/ProductVariant/")
            .then(|| ButtonItem::bare(VariantGid::new(variant), 1))
    })
}

/// Render the product with a variant selected.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
) -> ProductTemplate {
    let (product, product_message) = product_view(state.product(), query.variant.as_deref());
    ProductTemplate {
        product,
        product_message,
    }
}

/// Render the button in its resting state.
///
/// Loaded by the `Added!` button after its confirmation delay.
#[instrument(skip(state))]
pub async fn button(
    State(state): State<AppState>,
    Query(query): Query<VariantQuery>,
) -> ButtonTemplate {
    let item = query
        .variant
        .as_deref()
        .and_then(|variant| button_item(state.product(), variant));

    match item {
        Some(item) => ButtonTemplate {
            variant_gid: item.variant_gid.as_str().to_string(),
            button: item.initial_state(),
        },
        None => ButtonTemplate {
            variant_gid: String::new(),
            button: ButtonState::Disabled,
        },
    }
}
