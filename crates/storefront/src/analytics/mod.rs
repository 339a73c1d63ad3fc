//! Shopify analytics for a headless sales channel.
//!
//! Sends `PAGE_VIEW` and `ADD_TO_CART` events to Shopify's analytics batch
//! endpoint. Nothing is sent unless the visitor's [`ConsentSnapshot`]
//! allows analytics, and a failed send is logged and otherwise ignored.

pub mod consent;
mod tracker;

pub use consent::{CONSENT_COOKIE, CONSENT_SESSION_COOKIE, ConsentFlags, ConsentSnapshot};
pub use tracker::{PAGE_VIEW_COOKIE, PageViewTracker};

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::{REFERER, USER_AGENT};
use chrono::{Duration, Utc};
use funnels_core::{ProductGid, ShopGid, VariantGid};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::AnalyticsConfig;
use crate::cookies::CookieJar;
use crate::shopify::Cart;

/// Long-lived visitor token cookie.
pub const UNIQUE_TOKEN_COOKIE: &str = "_shopify_y";

/// Visit (session) token cookie.
pub const VISIT_TOKEN_COOKIE: &str = "_shopify_s";

/// Header htmx sends with the URL of the page that issued the request.
const HX_CURRENT_URL: &str = "HX-Current-URL";

const PAGE_VIEW_SCHEMA: &str = "trekkie_storefront_page_view/1.4";
const CUSTOMER_EVENT_SCHEMA: &str = "custom_storefront_customer_tracking/1.0";
const ADD_TO_CART_EVENT: &str = "product_added_to_cart";

/// Errors from the analytics endpoint.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint rejected the batch.
    #[error("Analytics request failed: {status} - {message}")]
    Api { status: u16, message: String },
}

// =============================================================================
// Page types
// =============================================================================

/// Page type reported with a page view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    Home,
    Product,
    Page,
}

// =============================================================================
// Browser parameters
// =============================================================================

/// Visitor and page details attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowserParameters {
    pub unique_token: String,
    pub visit_token: String,
    pub url: String,
    pub path: String,
    pub search: String,
    pub referrer: String,
    pub user_agent: String,
}

impl BrowserParameters {
    /// Parameters for a full page request to `page`.
    ///
    /// Issues the tracking cookies when the visitor has none yet.
    #[must_use]
    pub fn for_page(jar: &CookieJar, headers: &HeaderMap, page: &Url) -> Self {
        let referrer = header_str(headers, REFERER.as_str()).unwrap_or_default();
        Self::build(jar, headers, page, referrer)
    }

    /// Parameters for a fragment or beacon request made from a page.
    ///
    /// The page URL comes from `HX-Current-URL`, then `Referer`, then
    /// `base_url`. `referrer` is the page's own referrer, when known.
    #[must_use]
    pub fn for_fragment(
        jar: &CookieJar,
        headers: &HeaderMap,
        base_url: &str,
        referrer: Option<&str>,
    ) -> Self {
        let page = header_str(headers, HX_CURRENT_URL)
            .or_else(|| header_str(headers, REFERER.as_str()))
            .and_then(|raw| Url::parse(&raw).ok())
            .or_else(|| Url::parse(base_url).ok());

        match page {
            Some(page) => Self::build(jar, headers, &page, referrer.unwrap_or_default().to_string()),
            None => {
                let (unique_token, visit_token) = tracking_tokens(jar);
                Self {
                    unique_token,
                    visit_token,
                    url: base_url.to_string(),
                    path: "/".to_string(),
                    search: String::new(),
                    referrer: referrer.unwrap_or_default().to_string(),
                    user_agent: header_str(headers, USER_AGENT.as_str()).unwrap_or_default(),
                }
            }
        }
    }

    fn build(jar: &CookieJar, headers: &HeaderMap, page: &Url, referrer: String) -> Self {
        let (unique_token, visit_token) = tracking_tokens(jar);
        Self {
            unique_token,
            visit_token,
            url: page.to_string(),
            path: page.path().to_string(),
            search: page.query().map(|q| format!("?{q}")).unwrap_or_default(),
            referrer,
            user_agent: header_str(headers, USER_AGENT.as_str()).unwrap_or_default(),
        }
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Read the visitor and visit tokens, issuing whichever is missing.
///
/// `_shopify_y` lives for a year, `_shopify_s` for thirty minutes.
pub fn tracking_tokens(jar: &CookieJar) -> (String, String) {
    let unique = jar.get(UNIQUE_TOKEN_COOKIE).unwrap_or_else(|| {
        let token = uuid::Uuid::new_v4().to_string();
        jar.set(
            UNIQUE_TOKEN_COOKIE,
            &token,
            Some(Utc::now() + Duration::days(365)),
        );
        token
    });
    let visit = jar.get(VISIT_TOKEN_COOKIE).unwrap_or_else(|| {
        let token = uuid::Uuid::new_v4().to_string();
        jar.set(
            VISIT_TOKEN_COOKIE,
            &token,
            Some(Utc::now() + Duration::minutes(30)),
        );
        token
    });
    (unique, visit)
}

// =============================================================================
// Event payloads
// =============================================================================

/// A product line in an add-to-cart event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsProduct {
    pub product_gid: ProductGid,
    pub variant_gid: VariantGid,
    pub name: String,
    pub variant_name: String,
    pub brand: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Unit price as a decimal string.
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Units added by this event.
    pub quantity: i64,
}

/// An add-to-cart event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddToCartEvent {
    pub cart_id: String,
    /// Cart total after the addition.
    pub total_value: f64,
    pub products: Vec<AnalyticsProduct>,
}

#[derive(Debug, Serialize)]
struct BasePayload<'a> {
    shop_id: &'a ShopGid,
    storefront_id: &'a str,
    shopify_sales_channel: &'static str,
    currency: &'static str,
    accepted_language: &'static str,
    #[serde(flatten)]
    consent: ConsentFlags,
    #[serde(flatten)]
    browser: &'a BrowserParameters,
}

#[derive(Debug, Serialize)]
struct PageViewPayload<'a> {
    #[serde(flatten)]
    base: BasePayload<'a>,
    page_type: PageType,
}

#[derive(Debug, Serialize)]
struct AddToCartPayload<'a> {
    #[serde(flatten)]
    base: BasePayload<'a>,
    event_name: &'static str,
    #[serde(flatten)]
    event: &'a AddToCartEvent,
}

#[derive(Debug, Serialize)]
struct Batch<T: Serialize> {
    events: Vec<BatchEvent<T>>,
    metadata: BatchMetadata,
}

#[derive(Debug, Serialize)]
struct BatchEvent<T: Serialize> {
    schema_id: &'static str,
    payload: T,
    metadata: EventMetadata,
}

#[derive(Debug, Serialize)]
struct BatchMetadata {
    event_sent_at_ms: i64,
}

#[derive(Debug, Serialize)]
struct EventMetadata {
    event_created_at_ms: i64,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the analytics batch endpoint.
///
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    inner: Arc<AnalyticsClientInner>,
}

#[derive(Debug)]
struct AnalyticsClientInner {
    client: reqwest::Client,
    endpoint: String,
    shop_id: ShopGid,
    storefront_id: String,
}

impl AnalyticsClient {
    /// Create a client for the configured endpoint.
    #[must_use]
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            inner: Arc::new(AnalyticsClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint.clone(),
                shop_id: ShopGid::new(config.shop_id.clone()),
                storefront_id: config.storefront_id.clone(),
            }),
        }
    }

    /// Send a page view if consent allows it.
    ///
    /// Returns whether the event was delivered.
    #[instrument(skip(self, consent, browser), fields(path = %browser.path))]
    pub async fn send_page_view(
        &self,
        consent: Option<&ConsentSnapshot>,
        browser: &BrowserParameters,
        page_type: PageType,
    ) -> bool {
        let Some(consent) = consent.filter(|c| c.analytics) else {
            debug!("Analytics not allowed; skipping page view");
            return false;
        };

        let payload = PageViewPayload {
            base: self.base(consent, browser),
            page_type,
        };
        self.deliver(PAGE_VIEW_SCHEMA, payload, "PAGE_VIEW").await
    }

    /// Send an add-to-cart event if consent allows it.
    ///
    /// Returns whether the event was delivered.
    #[instrument(skip_all, fields(cart_id = %event.cart_id))]
    pub async fn send_add_to_cart(
        &self,
        consent: Option<&ConsentSnapshot>,
        browser: &BrowserParameters,
        event: &AddToCartEvent,
    ) -> bool {
        let Some(consent) = consent.filter(|c| c.analytics) else {
            debug!("Analytics not allowed; skipping add to cart");
            return false;
        };

        let payload = AddToCartPayload {
            base: self.base(consent, browser),
            event_name: ADD_TO_CART_EVENT,
            event,
        };
        self.deliver(CUSTOMER_EVENT_SCHEMA, payload, "ADD_TO_CART")
            .await
    }

    fn base<'a>(
        &'a self,
        consent: &ConsentSnapshot,
        browser: &'a BrowserParameters,
    ) -> BasePayload<'a> {
        BasePayload {
            shop_id: &self.inner.shop_id,
            storefront_id: &self.inner.storefront_id,
            shopify_sales_channel: "headless",
            currency: "USD",
            accepted_language: "EN",
            consent: consent.flags(),
            browser,
        }
    }

    async fn deliver<T: Serialize>(&self, schema_id: &'static str, payload: T, label: &str) -> bool {
        match self.post(schema_id, payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send {label} analytics");
                false
            }
        }
    }

    async fn post<T: Serialize>(
        &self,
        schema_id: &'static str,
        payload: T,
    ) -> Result<(), AnalyticsError> {
        let now = Utc::now().timestamp_millis();
        let batch = Batch {
            events: vec![BatchEvent {
                schema_id,
                payload,
                metadata: EventMetadata {
                    event_created_at_ms: now,
                },
            }],
            metadata: BatchMetadata {
                event_sent_at_ms: now,
            },
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&batch)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnalyticsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

// =============================================================================
// Per-request context
// =============================================================================

/// The client plus one visitor's consent and browser details.
#[derive(Debug, Clone)]
pub struct AnalyticsContext {
    client: AnalyticsClient,
    consent: Option<ConsentSnapshot>,
    browser: BrowserParameters,
}

impl AnalyticsContext {
    /// Context for the visitor whose cookies are in `jar`.
    #[must_use]
    pub fn new(client: AnalyticsClient, jar: &CookieJar, browser: BrowserParameters) -> Self {
        Self {
            client,
            consent: ConsentSnapshot::load(jar),
            browser,
        }
    }

    /// Report units added to `cart`, valued at the cart's new total.
    pub async fn cart_addition(&self, cart: &Cart, product: AnalyticsProduct) -> bool {
        let event = AddToCartEvent {
            cart_id: cart.id.as_str().to_string(),
            total_value: cart.cost.total_amount.amount.parse().unwrap_or(0.0),
            products: vec![product],
        };
        self.client
            .send_add_to_cart(self.consent.as_ref(), &self.browser, &event)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AnalyticsClient {
        AnalyticsClient::new(&AnalyticsConfig {
            endpoint: format!("{}/produce_batch", server.uri()),
            shop_id: "gid://shopify/Shop/1".to_string(),
            storefront_id: "100".to_string(),
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
            user_agent: "test".to_string(),
        }
    }

    fn allowed() -> ConsentSnapshot {
        ConsentSnapshot {
            analytics: true,
            marketing: true,
            ..ConsentSnapshot::default()
        }
    }

    #[tokio::test]
    async fn page_view_posts_batch_with_base_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/produce_batch"))
            .and(body_partial_json(serde_json::json!({
                "events": [{
                    "schema_id": "trekkie_storefront_page_view/1.4",
                    "payload": {
                        "shop_id": "gid://shopify/Shop/1",
                        "shopify_sales_channel": "headless",
                        "currency": "USD",
                        "accepted_language": "EN",
                        "has_user_consent": true,
                        "analytics_allowed": true,
                        "marketing_allowed": true,
                        "sale_of_data_allowed": false,
                        "unique_token": "y",
                        "page_type": "home"
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sent = client(&server)
            .send_page_view(Some(&allowed()), &browser(), PageType::Home)
            .await;
        assert!(sent);
    }

    #[tokio::test]
    async fn nothing_is_sent_without_consent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(!client.send_page_view(None, &browser(), PageType::Home).await);
        assert!(
            !client
                .send_page_view(Some(&ConsentSnapshot::default()), &browser(), PageType::Home)
                .await
        );
    }

    #[tokio::test]
    async fn add_to_cart_carries_products() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "events": [{
                    "schema_id": "custom_storefront_customer_tracking/1.0",
                    "payload": {
                        "event_name": "product_added_to_cart",
                        "cart_id": "gid://shopify/Cart/c1",
                        "total_value": 20.0,
                        "products": [{
                            "product_gid": "gid://shopify/Product/7",
                            "variant_gid": "gid://shopify/ProductVariant/42",
                            "quantity": 1
                        }]
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let event = AddToCartEvent {
            cart_id: "gid://shopify/Cart/c1".to_string(),
            total_value: 20.0,
            products: vec![AnalyticsProduct {
                product_gid: ProductGid::new("gid://shopify/Product/7"),
                variant_gid: VariantGid::new("gid://shopify/ProductVariant/42"),
                name: "Snowboard".to_string(),
                variant_name: "Ice".to_string(),
                brand: String::new(),
                category: None,
                price: "10.00".to_string(),
                sku: None,
                quantity: 1,
            }],
        };

        assert!(
            client(&server)
                .send_add_to_cart(Some(&allowed()), &browser(), &event)
                .await
        );
    }

    #[tokio::test]
    async fn endpoint_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sent = client(&server)
            .send_page_view(Some(&allowed()), &browser(), PageType::Home)
            .await;
        assert!(!sent);
    }

    #[test]
    fn tracking_cookies_issued_once() {
        let jar = CookieJar::default();
        let first = tracking_tokens(&jar);
        let second = tracking_tokens(&jar);

        assert_eq!(first, second);
        assert_eq!(jar.pending().len(), 2);
        assert!(jar.pending()[0].starts_with("_shopify_y="));
    }

    #[test]
    fn existing_tracking_cookies_are_reused() {
        let jar = CookieJar::from_cookie_header("_shopify_y=abc; _shopify_s=def");
        assert_eq!(
            tracking_tokens(&jar),
            ("abc".to_string(), "def".to_string())
        );
        assert!(jar.pending().is_empty());
    }

    #[test]
    fn fragment_parameters_prefer_htmx_current_url() {
        let jar = CookieJar::from_cookie_header("_shopify_y=abc; _shopify_s=def");
        let mut headers = HeaderMap::new();
        headers.insert(
            HX_CURRENT_URL,
            HeaderValue::from_static("https://landing.example/?utm_source=ad"),
        );
        headers.insert(REFERER, HeaderValue::from_static("https://other.example/"));

        let params =
            BrowserParameters::for_fragment(&jar, &headers, "http://127.0.0.1:3000", None);
        assert_eq!(params.path, "/");
        assert_eq!(params.search, "?utm_source=ad");
        assert_eq!(params.referrer, "");
    }

    #[test]
    fn page_parameters_use_referer_as_referrer() {
        let jar = CookieJar::default();
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://search.example/"));
        let page = Url::parse("https://landing.example/").unwrap_or_else(|e| panic!("{e}"));

        let params = BrowserParameters::for_page(&jar, &headers, &page);
        assert_eq!(params.referrer, "https://search.example/");
        assert_eq!(params.url, "https://landing.example/");
    }
}
