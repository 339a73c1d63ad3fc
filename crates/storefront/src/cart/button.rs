//! Add-to-cart button.

use std::time::Duration;

use funnels_core::{ProductData, ProductGid, Variant, VariantGid};
use tokio::sync::watch;
use tracing::error;

use super::service::CartResponse;
use super::store::CartStore;
use crate::analytics::{AnalyticsContext, AnalyticsProduct};
use crate::events::{EventBus, PageEvent};

/// How long the `Added!` confirmation stays up.
pub const ADDED_RESET: Duration = Duration::from_secs(2);

/// What the button shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ButtonState {
    #[default]
    Idle,
    Adding,
    Added,
    Disabled,
}

impl ButtonState {
    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle | Self::Disabled => "Add to Cart",
            Self::Adding => "Adding...",
            Self::Added => "Added!",
        }
    }

    /// Whether clicks are ignored.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::Adding | Self::Disabled)
    }

    /// Whether the confirmation is showing.
    #[must_use]
    pub const fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }

    /// CSS modifier for templates.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Idle => "btn-idle",
            Self::Adding => "btn-adding",
            Self::Added => "btn-added",
            Self::Disabled => "btn-disabled",
        }
    }
}

/// What gets added, with the product details analytics needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonItem {
    pub variant_gid: VariantGid,
    pub variant_title: String,
    /// Unit price as a decimal string; `0` when unknown.
    pub price: String,
    pub quantity: i64,
    pub product_gid: Option<ProductGid>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub sku: Option<String>,
    pub available: bool,
}

impl ButtonItem {
    /// One unit of `variant` from the product blob.
    #[must_use]
    pub fn from_variant(product: &ProductData, variant: &Variant) -> Self {
        Self {
            variant_gid: variant.gid.clone(),
            variant_title: variant.title.clone(),
            price: variant.price.clone(),
            quantity: 1,
            product_gid: Some(product.gid.clone()),
            name: Some(product.title.clone()),
            brand: product.vendor.clone(),
            category: product.product_type.clone(),
            sku: variant.sku.clone(),
            available: variant.can_add_to_cart(),
        }
    }

    /// A bare variant with no product details.
    #[must_use]
    pub fn bare(variant_gid: VariantGid, quantity: i64) -> Self {
        Self {
            variant_gid,
            variant_title: String::new(),
            price: "0".to_string(),
            quantity,
            product_gid: None,
            name: None,
            brand: None,
            category: None,
            sku: None,
            available: true,
        }
    }

    /// State a fresh button starts in.
    #[must_use]
    pub const fn initial_state(&self) -> ButtonState {
        if self.available {
            ButtonState::Idle
        } else {
            ButtonState::Disabled
        }
    }

    fn analytics_product(&self) -> AnalyticsProduct {
        let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        AnalyticsProduct {
            product_gid: self
                .product_gid
                .clone()
                .unwrap_or_else(|| self.variant_gid.fallback_product_gid()),
            variant_gid: self.variant_gid.clone(),
            name: non_empty(&self.name).unwrap_or_else(|| "Product".to_string()),
            variant_name: self.variant_title.clone(),
            brand: non_empty(&self.brand).unwrap_or_default(),
            category: self.category.clone(),
            price: self.price.clone(),
            sku: self.sku.clone(),
            quantity: self.quantity,
        }
    }
}

/// An add-to-cart button bound to one item.
#[derive(Debug)]
pub struct AddToCartButton {
    item: ButtonItem,
    state: watch::Sender<ButtonState>,
}

impl AddToCartButton {
    #[must_use]
    pub fn new(item: ButtonItem) -> Self {
        let (state, _) = watch::channel(item.initial_state());
        Self { item, state }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ButtonState {
        *self.state.borrow()
    }

    /// Observe state changes, including the timed reset.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ButtonState> {
        self.state.subscribe()
    }

    /// Add the item to the cart.
    ///
    /// Ignored while adding or disabled. On success the new cart is
    /// broadcast with `cart-updated`, the drawer is opened, an add-to-cart
    /// event is reported, and the button shows `Added!` for
    /// [`ADDED_RESET`]. Returns `None` when the click was ignored.
    pub async fn click(
        &self,
        store: &CartStore,
        events: &EventBus,
        analytics: &AnalyticsContext,
    ) -> Option<CartResponse> {
        if self.state().is_disabled() {
            return None;
        }
        self.state.send_replace(ButtonState::Adding);

        let response = store
            .add_to_cart(&self.item.variant_gid, Some(self.item.quantity))
            .await;

        match (&response.cart, response.success) {
            (Some(cart), true) => {
                events.emit(PageEvent::CartUpdated(Some(Box::new(cart.clone()))));
                events.emit(PageEvent::OpenCart);
                analytics
                    .cart_addition(cart, self.item.analytics_product())
                    .await;

                self.state.send_replace(ButtonState::Added);
                self.schedule_reset();
            }
            _ => {
                error!(error = ?response.error, "Failed to add to cart");
                self.state.send_replace(ButtonState::Idle);
            }
        }

        Some(response)
    }

    /// Return to idle after [`ADDED_RESET`] unless something else happened.
    fn schedule_reset(&self) {
        let mut rx = self.state.subscribe();
        let state = self.state.clone();
        rx.mark_unchanged();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(ADDED_RESET) => {
                    state.send_if_modified(|current| {
                        let added = *current == ButtonState::Added;
                        if added {
                            *current = ButtonState::Idle;
                        }
                        added
                    });
                }
                _ = rx.changed() => {}
            }
        });
    }
}
