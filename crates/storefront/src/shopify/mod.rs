//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Uses the `graphql-client` request/response envelopes with hand-written
//!   query documents (see `storefront::queries`)
//! - Shopify is source of truth - NO local sync, direct API calls
//! - Authenticates with the public Storefront access token
//!
//! # Example
//!
//! ```rust,ignore
//! use funnels_storefront::shopify::{CartLineInput, StorefrontClient};
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! let cart = client.create_cart(vec![CartLineInput {
//!     merchandise_id: variant.gid.clone(),
//!     quantity: 1,
//! }]).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with Shopify APIs.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response arrived.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("Shopify API request failed: {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase for the status.
        reason: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User errors from a cart mutation (e.g., invalid variant).
    #[error("{}", first_user_error(.0))]
    UserError(Vec<CartUserError>),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

impl GraphQLError {
    /// An error with only a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }
    }
}

fn first_user_error(errors: &[CartUserError]) -> &str {
    errors
        .first()
        .map_or("Unknown cart error", |e| e.message.as_str())
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ShopifyError::Status {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shopify API request failed: Service Unavailable"
        );
    }

    #[test]
    fn test_user_error_shows_first_message() {
        let err = ShopifyError::UserError(vec![
            CartUserError {
                code: Some("INVALID".to_string()),
                field: Some(vec!["lines".to_string()]),
                message: "Variant is sold out".to_string(),
            },
            CartUserError {
                code: None,
                field: None,
                message: "Second".to_string(),
            },
        ]);
        assert_eq!(err.to_string(), "Variant is sold out");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_graphql_error_with_path_and_location() {
        let errors = vec![GraphQLError {
            message: String::new(),
            locations: vec![GraphQLErrorLocation { line: 5, column: 10 }],
            path: vec![
                serde_json::Value::String("cartLinesAdd".to_string()),
                serde_json::Value::Number(0.into()),
            ],
        }];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: path: cartLinesAdd.0 at line 5:10"
        );
    }

    #[test]
    fn test_graphql_error_empty_vec() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }
}
