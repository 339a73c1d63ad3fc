//! Cart operations keyed by the cart-id cookie.
//!
//! Every operation resolves to a [`CartResponse`]; failures are logged and
//! reported through `error` rather than returned as `Err`, and nothing is
//! retried.

use funnels_core::{CartLineId, VariantGid};
use serde::Serialize;
use tracing::{error, instrument, warn};

use crate::cookies::{CartCookie, CookieJar};
use crate::shopify::{
    Cart, CartLineInput, CartLineUpdateInput, ShopifyError, StorefrontClient,
};

/// Message when an operation needs a cart and none is persisted.
pub const NO_ACTIVE_CART: &str = "No active cart found";

/// Message when Shopify returns no cart for the persisted id.
pub const CART_NOT_FOUND: &str = "Cart not found";

/// Outcome of a cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cart: Option<Cart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CartResponse {
    /// A successful response carrying the server's cart.
    #[must_use]
    pub const fn ok(cart: Cart) -> Self {
        Self {
            success: true,
            cart: Some(cart),
            error: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cart: None,
            error: Some(message.into()),
        }
    }
}

/// Which operation failed; selects the message for GraphQL-level errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CartOperation {
    Create,
    Add,
    Update,
    Remove,
    Get,
}

impl CartOperation {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Create => "Failed to create cart",
            Self::Add => "Failed to add to cart",
            Self::Update => "Failed to update cart",
            Self::Remove => "Failed to remove from cart",
            Self::Get => "Failed to get cart",
        }
    }
}

/// Map a client error to the message shown to dependents.
///
/// GraphQL errors get the operation's generic message, user errors their
/// first message, a missing cart `Cart not found`, and transport or status
/// failures their own description.
fn failure_message(operation: CartOperation, err: &ShopifyError) -> String {
    match err {
        ShopifyError::GraphQL(_) => operation.failure_message().to_string(),
        ShopifyError::NotFound(_) => CART_NOT_FOUND.to_string(),
        other => other.to_string(),
    }
}

/// Cart operations for one visitor.
///
/// Cheap to clone. The cookie jar is request-scoped; everything else is
/// shared.
#[derive(Debug, Clone)]
pub struct CartService {
    client: StorefrontClient,
    cookie: CartCookie,
    jar: CookieJar,
    shop_domain: String,
    access_token: String,
}

impl CartService {
    /// Create a service for the visitor whose cookies are in `jar`.
    #[must_use]
    pub fn new(
        client: StorefrontClient,
        cookie: CartCookie,
        jar: CookieJar,
        shop_domain: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            cookie,
            jar,
            shop_domain: shop_domain.into(),
            access_token: access_token.into(),
        }
    }

    /// The persisted cart id, if any.
    #[must_use]
    pub fn cart_id(&self) -> Option<String> {
        self.cookie.get(&self.jar)
    }

    /// The request's cookie jar.
    #[must_use]
    pub const fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Create a cart holding one line and persist its id.
    #[instrument(skip(self), fields(variant = %variant))]
    pub async fn create_cart(&self, variant: &VariantGid, quantity: i64) -> CartResponse {
        let line = CartLineInput {
            merchandise_id: variant.clone(),
            quantity,
        };

        match self.client.create_cart(vec![line]).await {
            Ok(cart) => {
                self.cookie.save(&self.jar, cart.id.as_str());
                CartResponse::ok(cart)
            }
            Err(e) => {
                error!(error = %e, "Create cart error");
                CartResponse::failure(failure_message(CartOperation::Create, &e))
            }
        }
    }

    /// Add a variant, creating the cart when none is persisted.
    #[instrument(skip(self), fields(variant = %variant))]
    pub async fn add_to_cart(&self, variant: &VariantGid, quantity: i64) -> CartResponse {
        let Some(cart_id) = self.cart_id() else {
            return self.create_cart(variant, quantity).await;
        };

        let line = CartLineInput {
            merchandise_id: variant.clone(),
            quantity,
        };

        match self.client.add_lines(&cart_id, vec![line]).await {
            Ok(cart) => CartResponse::ok(cart),
            Err(e) => {
                error!(error = %e, "Add to cart error");
                CartResponse::failure(failure_message(CartOperation::Add, &e))
            }
        }
    }

    /// Set a line's quantity.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_cart_line(&self, line_id: &CartLineId, quantity: i64) -> CartResponse {
        let Some(cart_id) = self.cart_id() else {
            return CartResponse::failure(NO_ACTIVE_CART);
        };

        let update = CartLineUpdateInput {
            id: line_id.clone(),
            quantity,
        };

        match self.client.update_lines(&cart_id, vec![update]).await {
            Ok(cart) => CartResponse::ok(cart),
            Err(e) => {
                error!(error = %e, "Update cart line error");
                CartResponse::failure(failure_message(CartOperation::Update, &e))
            }
        }
    }

    /// Remove a line.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn remove_from_cart(&self, line_id: &CartLineId) -> CartResponse {
        let Some(cart_id) = self.cart_id() else {
            return CartResponse::failure(NO_ACTIVE_CART);
        };

        match self
            .client
            .remove_lines(&cart_id, vec![line_id.as_str().to_string()])
            .await
        {
            Ok(cart) => CartResponse::ok(cart),
            Err(e) => {
                error!(error = %e, "Remove from cart error");
                CartResponse::failure(failure_message(CartOperation::Remove, &e))
            }
        }
    }

    /// Fetch the persisted cart.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> CartResponse {
        let Some(cart_id) = self.cart_id() else {
            return CartResponse::failure(NO_ACTIVE_CART);
        };

        match self.client.get_cart(&cart_id).await {
            Ok(cart) => CartResponse::ok(cart),
            Err(e) => {
                warn!(error = %e, "Get cart error");
                CartResponse::failure(failure_message(CartOperation::Get, &e))
            }
        }
    }

    /// Forget the persisted cart.
    pub fn clear_cart(&self) {
        self.cookie.clear(&self.jar);
    }

    /// Cart permalink that attributes the order to this sales channel.
    ///
    /// `https://{shop}/cart/{variant}:{qty},...?access_token={token}` with
    /// numeric variant ids.
    #[must_use]
    pub fn cart_permalink(&self, cart: &Cart) -> String {
        cart_permalink(&self.shop_domain, &self.access_token, cart)
    }
}

/// Build a cart permalink for a shop domain and public token.
#[must_use]
pub fn cart_permalink(shop_domain: &str, access_token: &str, cart: &Cart) -> String {
    let items = cart
        .lines
        .iter()
        .map(|line| format!("{}:{}", line.merchandise.id.numeric_id(), line.quantity))
        .collect::<Vec<_>>()
        .join(",");

    format!("https://{shop_domain}/cart/{items}?access_token={access_token}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::{CartCost, CartLine, CartLineCost, CartMerchandise, Money};
    use funnels_core::CartId;
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn usd(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn service(server: &MockServer, jar: CookieJar) -> CartService {
        let client = StorefrontClient::with_endpoint(
            format!("{}/graphql.json", server.uri()),
            SecretString::from("token"),
        );
        CartService::new(
            client,
            CartCookie::for_store(Some("s1")),
            jar,
            "shop.example",
            "token",
        )
    }

    fn cart_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/new",
            "checkoutUrl": "https://shop.example/checkout",
            "lines": {"edges": [{"node": {
                "id": "gid://shopify/CartLine/1",
                "quantity": 1,
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/42",
                    "title": "Ice",
                    "product": {"title": "Snowboard"},
                    "price": {"amount": "10.00", "currencyCode": "USD"}
                },
                "cost": {"totalAmount": {"amount": "10.00", "currencyCode": "USD"}}
            }}]},
            "cost": {
                "totalAmount": {"amount": "10.00", "currencyCode": "USD"},
                "subtotalAmount": {"amount": "10.00", "currencyCode": "USD"}
            }
        })
    }

    #[tokio::test]
    async fn add_without_cart_creates_and_persists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"operationName": "cartCreate"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"cartCreate": {"cart": cart_json(), "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let jar = CookieJar::default();
        let service = service(&server, jar.clone());
        let response = service
            .add_to_cart(&VariantGid::new("gid://shopify/ProductVariant/42"), 1)
            .await;

        assert!(response.success);
        assert_eq!(service.cart_id().as_deref(), Some("gid://shopify/Cart/new"));
        assert_eq!(jar.pending().len(), 1);
    }

    #[tokio::test]
    async fn add_with_cart_uses_lines_add() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "operationName": "cartLinesAdd",
                "variables": {"cartId": "gid://shopify/Cart/old"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"cartLinesAdd": {"cart": cart_json(), "userErrors": []}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let jar = CookieJar::from_cookie_header("funnels_cart_s1=gid%3A%2F%2Fshopify%2FCart%2Fold");
        let response = service(&server, jar.clone())
            .add_to_cart(&VariantGid::new("gid://shopify/ProductVariant/42"), 1)
            .await;

        assert!(response.success);
        assert!(jar.pending().is_empty());
    }

    #[tokio::test]
    async fn operations_without_cart_fail_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let service = service(&server, CookieJar::default());
        let line = CartLineId::new("gid://shopify/CartLine/1");

        assert_eq!(
            service.update_cart_line(&line, 2).await,
            CartResponse::failure(NO_ACTIVE_CART)
        );
        assert_eq!(
            service.remove_from_cart(&line).await,
            CartResponse::failure(NO_ACTIVE_CART)
        );
        assert_eq!(service.get_cart().await, CartResponse::failure(NO_ACTIVE_CART));
    }

    #[tokio::test]
    async fn graphql_errors_use_operation_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{"message": "boom"}]
            })))
            .mount(&server)
            .await;

        let jar = CookieJar::from_cookie_header("funnels_cart_s1=abc");
        let service = service(&server, jar);
        let line = CartLineId::new("gid://shopify/CartLine/1");

        assert_eq!(
            service.update_cart_line(&line, 2).await.error.as_deref(),
            Some("Failed to update cart")
        );
        assert_eq!(
            service.remove_from_cart(&line).await.error.as_deref(),
            Some("Failed to remove from cart")
        );
        assert_eq!(
            service.get_cart().await.error.as_deref(),
            Some("Failed to get cart")
        );
        assert_eq!(
            service
                .add_to_cart(&VariantGid::new("gid://shopify/ProductVariant/1"), 1)
                .await
                .error
                .as_deref(),
            Some("Failed to add to cart")
        );
    }

    #[tokio::test]
    async fn create_failure_does_not_persist() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{"message": "boom"}]
            })))
            .mount(&server)
            .await;

        let jar = CookieJar::default();
        let response = service(&server, jar.clone())
            .create_cart(&VariantGid::new("gid://shopify/ProductVariant/1"), 1)
            .await;

        assert_eq!(response.error.as_deref(), Some("Failed to create cart"));
        assert!(jar.pending().is_empty());
    }

    #[tokio::test]
    async fn status_failure_reports_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let jar = CookieJar::from_cookie_header("funnels_cart_s1=abc");
        let response = service(&server, jar).get_cart().await;
        assert_eq!(
            response.error.as_deref(),
            Some("Shopify API request failed: Bad Gateway")
        );
    }

    #[tokio::test]
    async fn missing_remote_cart_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": {"cart": null}})),
            )
            .mount(&server)
            .await;

        let jar = CookieJar::from_cookie_header("funnels_cart_s1=abc");
        let response = service(&server, jar).get_cart().await;
        assert_eq!(response, CartResponse::failure(CART_NOT_FOUND));
    }

    #[test]
    fn clear_cart_expires_cookie() {
        let jar = CookieJar::from_cookie_header("funnels_cart_s1=abc");
        let service = CartService::new(
            StorefrontClient::with_endpoint("http://unused", SecretString::from("t")),
            CartCookie::for_store(Some("s1")),
            jar.clone(),
            "shop.example",
            "t",
        );
        service.clear_cart();
        assert!(service.cart_id().is_none());
        assert!(jar.pending()[0].contains("1970"));
    }

    #[test]
    fn permalink_lists_numeric_variants() {
        let line = |variant: &str, quantity| CartLine {
            id: CartLineId::new("l"),
            quantity,
            merchandise: CartMerchandise {
                id: VariantGid::new(variant),
                title: String::new(),
                product_title: String::new(),
                price: usd("1"),
                compare_at_price: None,
                image_url: None,
            },
            cost: CartLineCost {
                total_amount: usd("1"),
                amount_per_quantity: None,
                compare_at_amount_per_quantity: None,
            },
        };
        let cart = Cart {
            id: CartId::new("gid://shopify/Cart/1"),
            checkout_url: String::new(),
            lines: vec![
                line("gid://shopify/ProductVariant/123", 2),
                line("gid://shopify/ProductVariant/456", 1),
            ],
            cost: CartCost {
                total_amount: usd("3"),
                subtotal_amount: usd("3"),
            },
        };

        assert_eq!(
            cart_permalink("shop.example", "tok", &cart),
            "https://shop.example/cart/123:2,456:1?access_token=tok"
        );
    }
}
