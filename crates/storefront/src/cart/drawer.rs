//! Cart drawer and badge.
//!
//! The drawer lists visible lines with quantity controls and a checkout
//! button; the badge shows the item count. Both render from a
//! [`CartState`] snapshot.

use funnels_core::format_price;

use super::service::CartResponse;
use super::store::{CartState, CartStore};
use crate::analytics::{AnalyticsContext, AnalyticsProduct};
use crate::events::PageEvent;
use crate::shopify::{Cart, CartLine};

/// Subtotal shown when there is no cart.
pub const EMPTY_SUBTOTAL: &str = "$0.00";

/// Largest count the badge prints before switching to `99+`.
const BADGE_MAX: u32 = 99;

// =============================================================================
// Open / closed
// =============================================================================

/// Whether the drawer is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawerState {
    pub open: bool,
}

impl DrawerState {
    /// `open-cart` opens, `toggle-cart` flips; other events leave it alone.
    pub const fn apply(&mut self, event: &PageEvent) {
        match event {
            PageEvent::OpenCart => self.open = true,
            PageEvent::ToggleCart => self.open = !self.open,
            PageEvent::CartUpdated(_) | PageEvent::AnalyticsReady => {}
        }
    }

    /// Escape closes the drawer.
    pub fn key(&mut self, key: &str) {
        if key == "Escape" {
            self.open = false;
        }
    }

    /// Fold a sequence of events over a closed drawer.
    #[must_use]
    pub fn after(events: &[PageEvent]) -> Self {
        let mut state = Self::default();
        for event in events {
            state.apply(event);
        }
        state
    }
}

// =============================================================================
// Views
// =============================================================================

/// A drawer line for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub product_title: String,
    pub variant_title: String,
    pub quantity: i64,
    pub price: String,
    pub image_url: Option<String>,
}

impl CartItemView {
    #[must_use]
    pub const fn decrement(&self) -> i64 {
        self.quantity - 1
    }

    #[must_use]
    pub const fn increment(&self) -> i64 {
        self.quantity + 1
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        let price = &line.merchandise.price;
        Self {
            id: line.id.as_str().to_string(),
            product_title: line.merchandise.product_title.clone(),
            variant_title: line.merchandise.title.clone(),
            quantity: line.quantity,
            price: format_price(&price.amount, &price.currency_code),
            image_url: line.merchandise.image_url.clone(),
        }
    }
}

/// Drawer and badge data for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
    /// Badge text; `None` hides the badge.
    pub badge: Option<String>,
    pub loading: bool,
    pub checkout_disabled: bool,
}

impl CartView {
    /// An empty, settled cart.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(&CartState {
            cart: None,
            loading: false,
            is_initialized: true,
        })
    }
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        let items: Vec<CartItemView> = state
            .cart
            .as_ref()
            .map(|cart| cart.visible_lines().map(CartItemView::from).collect())
            .unwrap_or_default();
        let subtotal = state.cart.as_ref().map_or_else(
            || EMPTY_SUBTOTAL.to_string(),
            |cart| cart.cost.subtotal_amount.display(),
        );
        let item_count = state.item_count();

        Self {
            checkout_disabled: items.is_empty() || state.loading,
            items,
            subtotal,
            item_count,
            badge: badge_label(item_count, state.is_initialized),
            loading: state.loading,
        }
    }
}

/// Badge text: hidden until initialized and while empty, capped at `99+`.
#[must_use]
pub fn badge_label(item_count: u32, is_initialized: bool) -> Option<String> {
    if !is_initialized || item_count == 0 {
        return None;
    }
    if item_count > BADGE_MAX {
        return Some(format!("{BADGE_MAX}+"));
    }
    Some(item_count.to_string())
}

// =============================================================================
// Quantity controls
// =============================================================================

/// Apply a quantity control to `line`.
///
/// Below 1 removes the line. An increase that succeeds reports the added
/// units (`new - old`) as an add-to-cart event.
pub async fn change_quantity(
    store: &CartStore,
    analytics: &AnalyticsContext,
    line: &CartLine,
    quantity: i64,
) -> CartResponse {
    if quantity < 1 {
        return store.remove_from_cart(&line.id).await;
    }

    let response = store.update_quantity(&line.id, quantity).await;

    if response.success
        && quantity > line.quantity
        && let Some(cart) = &response.cart
    {
        analytics
            .cart_addition(cart, added_units(line, quantity - line.quantity))
            .await;
    }

    response
}

fn added_units(line: &CartLine, quantity: i64) -> AnalyticsProduct {
    let merchandise = &line.merchandise;
    AnalyticsProduct {
        product_gid: merchandise.id.fallback_product_gid(),
        variant_gid: merchandise.id.clone(),
        name: merchandise.product_title.clone(),
        variant_name: merchandise.title.clone(),
        brand: String::new(),
        category: None,
        price: merchandise.price.amount.clone(),
        sku: None,
        quantity,
    }
}

/// Where checkout sends the visitor, or `None` when the cart is empty.
#[must_use]
pub fn checkout_target(store: &CartStore, cart: &Cart) -> Option<String> {
    (cart.item_count() > 0).then(|| store.service().cart_permalink(cart))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsClient, BrowserParameters, ConsentSnapshot};
    use crate::config::AnalyticsConfig;
    use crate::cookies::{CartCookie, CookieJar};
    use crate::cart::CartService;
    use crate::shopify::{CartCost, CartLineCost, CartMerchandise, Money, StorefrontClient};
    use funnels_core::{CartId, CartLineId, VariantGid};
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn usd(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn line(id: &str, quantity: i64) -> CartLine {
        CartLine {
            id: CartLineId::new(id),
            quantity,
            merchandise: CartMerchandise {
                id: VariantGid::new("gid://shopify/ProductVariant/42"),
                title: "Ice".to_string(),
                product_title: "Snowboard".to_string(),
                price: usd("10.00"),
                compare_at_price: None,
                image_url: None,
            },
            cost: CartLineCost {
                total_amount: usd("10.00"),
                amount_per_quantity: None,
                compare_at_amount_per_quantity: None,
            },
        }
    }

    fn cart(lines: Vec<CartLine>) -> Cart {
        Cart {
            id: CartId::new("gid://shopify/Cart/c1"),
            checkout_url: "https://shop.example/checkout".to_string(),
            lines,
            cost: CartCost {
                total_amount: usd("1234.5"),
                subtotal_amount: usd("1234.5"),
            },
        }
    }

    fn cart_json(quantity: i64) -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/c1",
            "checkoutUrl": "https://shop.example/checkout",
            "lines": {"edges": [{"node": {
                "id": "gid://shopify/CartLine/1",
                "quantity": quantity,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/42",
                    "title": "Ice",
                    "product": {"title": "Snowboard"},
                    "price": {"amount": "10.00", "currencyCode": "USD"}
                },
                "cost": {"totalAmount": {"amount": "30.00", "currencyCode": "USD"}}
            }}]},
            "cost": {
                "totalAmount": {"amount": "30.00", "currencyCode": "USD"},
                "subtotalAmount": {"amount": "30.00", "currencyCode": "USD"}
            }
        })
    }

    fn browser() -> BrowserParameters {
        BrowserParameters {
            unique_token: "y".to_string(),
            visit_token: "s".to_string(),
            url: "https://landing.example/".to_string(),
            path: "/".to_string(),
            search: String::new(),
            referrer: String::new(),
            user_agent: String::new(),
        }
    }

    fn fixtures(server: &MockServer) -> (CartStore, AnalyticsContext) {
        let jar = CookieJar::from_cookie_header("funnels_cart_s1=c1");
        ConsentSnapshot {
            analytics: true,
            ..ConsentSnapshot::default()
        }
        .save(&jar);

        let client = StorefrontClient::with_endpoint(
            format!("{}/graphql.json", server.uri()),
            SecretString::from("token"),
        );
        let store = CartStore::new(CartService::new(
            client,
            CartCookie::for_store(Some("s1")),
            jar.clone(),
            "shop.example",
            "token",
        ));
        let analytics = AnalyticsContext::new(
            AnalyticsClient::new(&AnalyticsConfig {
                endpoint: format!("{}/analytics", server.uri()),
                shop_id: "gid://shopify/Shop/1".to_string(),
                storefront_id: String::new(),
            }),
            &jar,
            browser(),
        );
        (store, analytics)
    }

    #[test]
    fn drawer_follows_open_and_toggle() {
        assert!(DrawerState::after(&[PageEvent::OpenCart]).open);
        assert!(DrawerState::after(&[PageEvent::ToggleCart]).open);
        assert!(!DrawerState::after(&[PageEvent::OpenCart, PageEvent::ToggleCart]).open);
        assert!(DrawerState::after(&[PageEvent::OpenCart, PageEvent::OpenCart]).open);

        let mut drawer = DrawerState { open: true };
        drawer.key("Enter");
        assert!(drawer.open);
        drawer.key("Escape");
        assert!(!drawer.open);
    }

    #[test]
    fn view_hides_zero_quantity_lines() {
        let state = CartState {
            cart: Some(cart(vec![line("a", 2), line("b", 0)])),
            loading: false,
            is_initialized: true,
        };
        let view = CartView::from(&state);

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.item_count, 2);
        assert_eq!(view.subtotal, "$1,234.50");
        assert_eq!(view.badge.as_deref(), Some("2"));
        assert!(!view.checkout_disabled);
    }

    #[test]
    fn empty_view_disables_checkout() {
        let view = CartView::empty();
        assert!(view.items.is_empty());
        assert_eq!(view.subtotal, EMPTY_SUBTOTAL);
        assert_eq!(view.badge, None);
        assert!(view.checkout_disabled);
    }

    #[test]
    fn loading_disables_checkout() {
        let view = CartView::from(&CartState {
            cart: Some(cart(vec![line("a", 1)])),
            loading: true,
            is_initialized: true,
        });
        assert!(view.checkout_disabled);
    }

    #[test]
    fn badge_caps_and_waits_for_initialization() {
        assert_eq!(badge_label(5, false), None);
        assert_eq!(badge_label(0, true), None);
        assert_eq!(badge_label(99, true).as_deref(), Some("99"));
        assert_eq!(badge_label(100, true).as_deref(), Some("99+"));
    }

    #[tokio::test]
    async fn increase_reports_added_units() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .and(body_partial_json(serde_json::json!({
                "operationName": "cartLinesUpdate",
                "variables": {"lines": [{"id": "gid://shopify/CartLine/1", "quantity": 3}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"cartLinesUpdate": {"cart": cart_json(3), "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/analytics"))
            .and(body_partial_json(serde_json::json!({
                "events": [{"payload": {
                    "total_value": 30.0,
                    "products": [{"quantity": 1, "product_gid": "gid://shopify/Product/42"}]
                }}]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let (store, analytics) = fixtures(&server);
        let response =
            change_quantity(&store, &analytics, &line("gid://shopify/CartLine/1", 2), 3).await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn decrease_sends_no_analytics() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"cartLinesUpdate": {"cart": cart_json(1), "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/analytics"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (store, analytics) = fixtures(&server);
        let response =
            change_quantity(&store, &analytics, &line("gid://shopify/CartLine/1", 2), 1).await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn below_one_removes_line() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"operationName": "cartLinesRemove"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"cartLinesRemove": {"cart": cart_json(0), "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (store, analytics) = fixtures(&server);
        let response =
            change_quantity(&store, &analytics, &line("gid://shopify/CartLine/1", 1), 0).await;
        assert!(response.success);
        assert_eq!(store.state().item_count(), 0);
    }
}
