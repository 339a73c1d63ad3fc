//! Integration test harness for the funnels storefront.
//!
//! Builds the real router against `wiremock` stand-ins for the Storefront
//! API, the CMS endpoint and the analytics endpoint, and drives it with
//! `tower::ServiceExt::oneshot`. No network access or running server is
//! needed.
//!
//! ```bash
//! cargo test -p funnels-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::path::PathBuf;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use funnels_storefront::config::{AnalyticsConfig, ShopifyStorefrontConfig, StorefrontConfig};
use funnels_storefront::product::load_product_data;
use funnels_storefront::shopify::StorefrontClient;
use funnels_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

/// Store id in the sample product blob.
pub const STORE_ID: &str = "funnels-demo";

/// Cart cookie name for [`STORE_ID`].
pub const CART_COOKIE: &str = "funnels_cart_funnels-demo";

/// Public token the harness configures.
pub const PUBLIC_TOKEN: &str = "public-token-for-tests";

/// Shop domain the harness configures.
pub const SHOP_DOMAIN: &str = "funnels-demo.myshopify.com";

/// Mock upstreams plus the router under test.
pub struct TestContext {
    pub shopify: MockServer,
    pub cms: MockServer,
    pub analytics: MockServer,
    pub app: Router,
}

impl TestContext {
    /// Router with the CMS endpoint configured.
    pub async fn new() -> Self {
        Self::build(true).await
    }

    /// Router with no `CMS_SPEC_URL`.
    pub async fn without_cms() -> Self {
        Self::build(false).await
    }

    async fn build(with_cms: bool) -> Self {
        let shopify = MockServer::start().await;
        let cms = MockServer::start().await;
        let analytics = MockServer::start().await;

        let config = StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 3000,
            base_url: "http://landing.test".to_string(),
            shopify: ShopifyStorefrontConfig {
                store: SHOP_DOMAIN.to_string(),
                api_version: "2025-01".to_string(),
                storefront_public_token: SecretString::from(PUBLIC_TOKEN),
            },
            store_id: None,
            product_data_path: sample_product_path(),
            cms_spec_url: with_cms.then(|| format!("{}/page.json", cms.uri())),
            analytics: AnalyticsConfig {
                endpoint: analytics.uri(),
                shop_id: "gid://shopify/Shop/1".to_string(),
                storefront_id: "1000".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        };

        let product = load_product_data(&config.product_data_path)
            .unwrap_or_else(|e| panic!("{e}"));
        let client =
            StorefrontClient::with_endpoint(shopify.uri(), SecretString::from(PUBLIC_TOKEN));
        let app = funnels_storefront::app(AppState::with_parts(config, client, product));

        Self {
            shopify,
            cms,
            analytics,
            app,
        }
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        TestResponse::read(response).await
    }

    /// `GET path` with optional `Cookie` header.
    pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::get(path);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(request.body(Body::empty()).unwrap_or_else(|e| panic!("{e}")))
            .await
    }

    /// `POST path` with a urlencoded form and optional `Cookie` header.
    pub async fn post_form(&self, path: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        let mut request = Request::post(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(
            request
                .body(Body::from(form.to_string()))
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
    }

    /// `POST path` with a JSON body and optional `Cookie` header.
    pub async fn post_json(&self, path: &str, body: &Value, cookie: Option<&str>) -> TestResponse {
        let mut request =
            Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.send(
            request
                .body(Body::from(body.to_string()))
                .unwrap_or_else(|e| panic!("{e}")),
        )
        .await
    }
}

/// A fully read response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    async fn read(response: Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .unwrap_or_else(|e| panic!("{e}"));
        Self {
            status: parts.status,
            headers: parts.headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// A header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every `Set-Cookie` value.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// The `Set-Cookie` value for `name`, if one was sent.
    #[must_use]
    pub fn set_cookie(&self, name: &str) -> Option<&str> {
        let prefix = format!("{name}=");
        self.set_cookies()
            .into_iter()
            .find(|cookie| cookie.starts_with(&prefix))
    }

    /// `HX-Trigger` parsed as JSON.
    #[must_use]
    pub fn hx_trigger(&self) -> Option<Value> {
        self.header("HX-Trigger")
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Path of the sample product blob shipped with the storefront.
#[must_use]
pub fn sample_product_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../storefront/content/product.json")
}

/// `Cookie` header carrying a cart id.
#[must_use]
pub fn cart_cookie(cart_id: &str) -> String {
    format!("{CART_COOKIE}={}", urlencoding::encode(cart_id))
}

/// `Cookie` header value granting analytics consent reported this session.
#[must_use]
pub fn consent_cookie() -> String {
    format!("{}; funnels_consent_session=1", stored_consent_cookie())
}

/// `Cookie` header value granting analytics consent kept from an earlier
/// visit.
#[must_use]
pub fn stored_consent_cookie() -> String {
    let snapshot = json!({"analytics": true, "marketing": true, "region": "USCA"});
    format!(
        "funnels_consent={}",
        urlencoding::encode(&snapshot.to_string())
    )
}

/// A Storefront API cart with one line per `(line id, variant id, quantity)`.
#[must_use]
pub fn cart_json(lines: &[(&str, &str, i64)]) -> Value {
    let edges: Vec<Value> = lines
        .iter()
        .map(|(line, variant, quantity)| {
            json!({"node": {
                "id": format!("gid://shopify/CartLine/{line}"),
                "quantity": quantity,
                "merchandise": {
                    "id": format!("gid://shopify/ProductVariant/{variant}"),
                    "title": "Ice",
                    "product": {"title": "The Complete Snowboard"},
                    "price": {"amount": "699.95", "currencyCode": "USD"}
                },
                "cost": {"totalAmount": {"amount": "699.95", "currencyCode": "USD"}}
            }})
        })
        .collect();

    json!({
        "id": "gid://shopify/Cart/c1",
        "checkoutUrl": format!("https://{SHOP_DOMAIN}/cart/c/c1"),
        "lines": {"edges": edges},
        "cost": {
            "totalAmount": {"amount": "1399.90", "currencyCode": "USD"},
            "subtotalAmount": {"amount": "1399.90", "currencyCode": "USD"}
        }
    })
}

/// A minimal valid CMS document.
#[must_use]
pub fn landing_page_json() -> Value {
    json!({
        "version": "1.0",
        "page": {"title": "The Complete Snowboard - Ride Everything"},
        "messaging": {
            "mainPromise": "Ride everything",
            "mainBenefit": "One board for every condition",
            "pricePosition": "Premium",
            "audience": "All-mountain riders",
            "toneOfVoice": "Confident",
            "keyObjections": ["Too expensive"]
        },
        "listicle": {"formatDescription": "Reasons", "itemCount": 3, "orderingLogic": "Impact"},
        "components": [
            {
                "type": "hero",
                "content": {
                    "headline": "Ride Everything",
                    "ctas": [{"label": "Shop Now", "action": "scroll_to:product"}]
                }
            },
            {
                "type": "faq",
                "content": {
                    "headline": "Questions",
                    "items": [{"title": "Does it float?", "text": "Yes."}]
                }
            },
            {"type": "footer", "content": {}}
        ]
    })
}
