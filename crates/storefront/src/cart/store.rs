//! The cart state store.
//!
//! Owns the in-memory cart for one visitor and publishes [`CartState`]
//! snapshots over a `tokio::sync::watch` channel so any number of views
//! (badge, drawer) observe the latest state.
//!
//! Mutations are not sequenced: concurrent calls each set `loading` and the
//! last response to arrive replaces the cart.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use funnels_core::{CartLineId, VariantGid};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use super::service::{CartResponse, CartService};
use crate::events::PageEvent;
use crate::shopify::Cart;

/// Snapshot of the cart as views see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    /// Last cart returned by Shopify.
    pub cart: Option<Cart>,
    /// An operation is in flight.
    pub loading: bool,
    /// The initial fetch has finished.
    pub is_initialized: bool,
}

impl Default for CartState {
    fn default() -> Self {
        Self {
            cart: None,
            loading: true,
            is_initialized: false,
        }
    }
}

impl CartState {
    /// Sum of positive line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }
}

/// Cart store for one visitor.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

#[derive(Debug)]
struct CartStoreInner {
    service: CartService,
    state: watch::Sender<CartState>,
    mounted: AtomicBool,
}

impl CartStore {
    /// Create an unmounted store.
    #[must_use]
    pub fn new(service: CartService) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartStoreInner {
                service,
                state,
                mounted: AtomicBool::new(false),
            }),
        }
    }

    /// The underlying cart service.
    #[must_use]
    pub fn service(&self) -> &CartService {
        &self.inner.service
    }

    /// Current snapshot.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Receive every future snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    /// Hydrate from the persisted cart id. Only the first call does anything.
    ///
    /// A missing id or a failed fetch leaves the cart empty; either way the
    /// store ends initialized and not loading.
    #[instrument(skip(self))]
    pub async fn mount(&self) {
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            return;
        }

        let cart = if self.inner.service.cart_id().is_some() {
            self.inner.service.get_cart().await.cart
        } else {
            None
        };

        self.inner.state.send_modify(|state| {
            if cart.is_some() {
                state.cart = cart;
            }
            state.is_initialized = true;
            state.loading = false;
        });
    }

    /// Add a variant; `quantity` defaults to 1.
    pub async fn add_to_cart(&self, variant: &VariantGid, quantity: Option<i64>) -> CartResponse {
        let quantity = quantity.unwrap_or(1);
        self.run(self.inner.service.add_to_cart(variant, quantity))
            .await
    }

    /// Set a line's quantity. Anything below 1 removes the line instead.
    pub async fn update_quantity(&self, line_id: &CartLineId, quantity: i64) -> CartResponse {
        if quantity < 1 {
            return self.remove_from_cart(line_id).await;
        }
        self.run(self.inner.service.update_cart_line(line_id, quantity))
            .await
    }

    /// Remove a line.
    pub async fn remove_from_cart(&self, line_id: &CartLineId) -> CartResponse {
        self.run(self.inner.service.remove_from_cart(line_id)).await
    }

    /// Refetch the cart.
    pub async fn refresh_cart(&self) -> CartResponse {
        self.run(self.inner.service.get_cart()).await
    }

    /// React to a page event.
    ///
    /// `cart-updated` with a cart replaces state without a round trip;
    /// without one it refetches. Other events are ignored.
    pub async fn handle_event(&self, event: &PageEvent) {
        match event {
            PageEvent::CartUpdated(Some(cart)) => {
                let cart = cart.as_ref().clone();
                self.inner.state.send_modify(|state| state.cart = Some(cart));
            }
            PageEvent::CartUpdated(None) => {
                self.refresh_cart().await;
            }
            PageEvent::OpenCart | PageEvent::ToggleCart | PageEvent::AnalyticsReady => {}
        }
    }

    /// Apply events from a bus until it closes.
    #[must_use]
    pub fn listen(&self, mut events: broadcast::Receiver<PageEvent>) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => store.handle_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Cart store lagged behind page events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Flag loading for the duration of an operation and keep its cart.
    async fn run(&self, operation: impl Future<Output = CartResponse>) -> CartResponse {
        self.inner.state.send_modify(|state| state.loading = true);
        let response = operation.await;
        self.inner.state.send_modify(|state| {
            if response.success
                && let Some(cart) = &response.cart
            {
                state.cart = Some(cart.clone());
            }
            state.loading = false;
        });
        response
    }
}
