//! Application state shared across handlers.

use std::sync::Arc;

use funnels_core::ProductData;
use url::Url;

use crate::analytics::{AnalyticsClient, AnalyticsContext, BrowserParameters, PageViewTracker};
use crate::cart::{CartService, CartStore};
use crate::cms::CmsClient;
use crate::config::StorefrontConfig;
use crate::cookies::{CartCookie, CookieJar};
use crate::product::{ProductDataError, load_product_data};
use crate::shopify::StorefrontClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the long-lived clients; everything
/// tied to one visitor is built per request from their [`CookieJar`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    cms: CmsClient,
    analytics: AnalyticsClient,
    product: Option<ProductData>,
    cart_cookie: CartCookie,
}

impl AppState {
    /// Create state, loading the product blob from the configured path.
    ///
    /// # Errors
    ///
    /// Returns `ProductDataError` if the blob exists but is unreadable.
    pub fn new(config: StorefrontConfig) -> Result<Self, ProductDataError> {
        let product = load_product_data(&config.product_data_path)?;
        if product.is_none() {
            tracing::warn!(
                path = %config.product_data_path.display(),
                "No product data found; rendering without a product"
            );
        }
        let storefront = StorefrontClient::new(&config.shopify);
        Ok(Self::with_parts(config, storefront, product))
    }

    /// Create state from already-built parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        product: Option<ProductData>,
    ) -> Self {
        let store_id = config
            .store_id
            .clone()
            .or_else(|| product.as_ref().and_then(|p| p.store_id.clone()));
        let cart_cookie = CartCookie::for_store(store_id.as_deref());
        let cms = CmsClient::new(config.cms_spec_url.clone());
        let analytics = AnalyticsClient::new(&config.analytics);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                cms,
                analytics,
                product,
                cart_cookie,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the Shopify Storefront API client.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    /// Get a reference to the CMS client.
    #[must_use]
    pub fn cms(&self) -> &CmsClient {
        &self.inner.cms
    }

    /// Get a reference to the analytics client.
    #[must_use]
    pub fn analytics(&self) -> &AnalyticsClient {
        &self.inner.analytics
    }

    /// The landing page product, if one is configured.
    #[must_use]
    pub fn product(&self) -> Option<&ProductData> {
        self.inner.product.as_ref()
    }

    /// Cookie holding the cart id for this store.
    #[must_use]
    pub fn cart_cookie(&self) -> &CartCookie {
        &self.inner.cart_cookie
    }

    /// The site's public URL.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if `STOREFRONT_BASE_URL` is not a URL.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.inner.config.base_url)
    }

    /// A cart store for the visitor whose cookies are in `jar`.
    #[must_use]
    pub fn cart_store(&self, jar: &CookieJar) -> CartStore {
        let shopify = &self.inner.config.shopify;
        CartStore::new(CartService::new(
            self.inner.storefront.clone(),
            self.inner.cart_cookie.clone(),
            jar.clone(),
            shopify.store.clone(),
            shopify.public_token(),
        ))
    }

    /// Analytics context for a fragment request.
    #[must_use]
    pub fn analytics_context(
        &self,
        jar: &CookieJar,
        headers: &axum::http::HeaderMap,
    ) -> AnalyticsContext {
        let browser =
            BrowserParameters::for_fragment(jar, headers, &self.inner.config.base_url, None);
        AnalyticsContext::new(self.inner.analytics.clone(), jar, browser)
    }

    /// Page view tracker for the visitor whose cookies are in `jar`.
    #[must_use]
    pub fn page_views(&self, jar: &CookieJar) -> PageViewTracker {
        PageViewTracker::new(self.inner.analytics.clone(), jar.clone())
    }
}
