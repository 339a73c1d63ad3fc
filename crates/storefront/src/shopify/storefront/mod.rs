//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` request/response envelopes with `reqwest` 0.13 for
//! HTTP. Carts are mutable state and are never cached.

mod conversions;
pub mod queries;

use std::sync::Arc;

use funnels_core::ProductData;
use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::types::{Cart, CartLineInput, CartLineUpdateInput};
use crate::shopify::{GraphQLError, GraphQLErrorLocation, ShopifyError};

use conversions::{convert_cart, convert_product, convert_user_error};
use queries::{
    AddToCart, CartMutationPayload, CreateCart, GetCart, GetProductByHandle, RemoveFromCart,
    UpdateCartLines, add_to_cart, create_cart, get_cart, get_product_by_handle,
    remove_from_cart, update_cart_lines,
};

/// Header carrying the public Storefront access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides the cart operations and a product lookup used to produce the
/// static product blob.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

impl std::fmt::Debug for StorefrontClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontClient")
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self::with_endpoint(config.endpoint(), config.storefront_public_token.clone())
    }

    /// Create a client for an explicit GraphQL endpoint.
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: endpoint.into(),
                access_token,
            }),
        }
    }

    /// The GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::GraphQL(vec![GraphQLError::message("No data in response")])
        })
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart holding the given lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let variables = create_cart::Variables {
            input: create_cart::CartInput { lines },
        };

        let data = self.execute::<CreateCart>(variables).await?;
        cart_from_payload(data.cart_create, "cartCreate")
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if Shopify returns no cart for the ID,
    /// or an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = add_to_cart::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };

        let data = self.execute::<AddToCart>(variables).await?;
        cart_from_payload(data.cart_lines_add, "cartLinesAdd")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines,
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_update, "cartLinesUpdate")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let variables = remove_from_cart::Variables {
            cart_id: cart_id.to_string(),
            line_ids,
        };

        let data = self.execute::<RemoveFromCart>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "cartLinesRemove")
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle, shaped as the static product blob.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has the handle, or an
    /// error if the API request fails.
    #[instrument(skip(self, store_id), fields(handle = %handle))]
    pub async fn get_product_by_handle(
        &self,
        handle: &str,
        store_id: Option<String>,
    ) -> Result<ProductData, ShopifyError> {
        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;
        let shop_domain = url::Url::parse(&self.inner.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(String::from));

        data.product
            .map(|product| convert_product(product, store_id, shop_domain))
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))
    }
}

/// Unwrap a cart mutation payload, surfacing user errors first.
fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    operation: &str,
) -> Result<Cart, ShopifyError> {
    let Some(result) = payload else {
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "{operation} returned no payload"
        ))]));
    };

    if !result.user_errors.is_empty() {
        return Err(ShopifyError::UserError(
            result
                .user_errors
                .into_iter()
                .map(convert_user_error)
                .collect(),
        ));
    }

    result.cart.map(convert_cart).ok_or_else(|| {
        ShopifyError::GraphQL(vec![GraphQLError::message(format!(
            "{operation} returned no cart"
        ))])
    })
}
