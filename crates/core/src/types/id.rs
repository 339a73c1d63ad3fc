//! Newtype Shopify global IDs for type-safe entity references.
//!
//! Shopify identifies every object with a global ID (GID) of the form
//! `gid://shopify/<Type>/<number>`. Carts carry an extra `?key=` suffix.
//! Use the `define_gid!` macro to create wrappers that prevent accidentally
//! passing a cart line ID where a variant ID is expected.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe GID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `numeric_id()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use funnels_core::define_gid;
/// define_gid!(VariantGid);
/// define_gid!(CartLineId);
///
/// let variant = VariantGid::new("gid://shopify/ProductVariant/42");
/// assert_eq!(variant.numeric_id(), "42");
///
/// // These are different types, so this won't compile:
/// // let _: CartLineId = variant;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying GID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the underlying GID string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// The trailing numeric segment of the GID, without any query.
            #[must_use]
            pub fn numeric_id(&self) -> &str {
                $crate::types::id::gid_tail(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_gid!(CartId);
define_gid!(CartLineId);
define_gid!(ProductGid);
define_gid!(VariantGid);

impl VariantGid {
    /// Derive the owning product's GID when only the variant is known.
    ///
    /// Analytics payloads need a product GID; cart lines only carry the
    /// variant, so `gid://shopify/ProductVariant/1` becomes
    /// `gid://shopify/Product/1`. The numeric part is the variant's, which
    /// is what the analytics endpoint accepts as a fallback.
    #[must_use]
    pub fn fallback_product_gid(&self) -> ProductGid {
        ProductGid::new(self.0.replacen("ProductVariant", "Product", 1))
    }
}

/// Last path segment of a GID with any `?query` removed.
#[must_use]
pub fn gid_tail(gid: &str) -> &str {
    let path = gid.split_once('?').map_or(gid, |(path, _)| path);
    path.rsplit('/').next().unwrap_or(path)
}

/// A shop-level identifier (`gid://shopify/Shop/<n>`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShopGid(String);

impl ShopGid {
    /// Create a new shop GID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying GID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_id_takes_last_segment() {
        let variant = VariantGid::new("gid://shopify/ProductVariant/42621513269366");
        assert_eq!(variant.numeric_id(), "42621513269366");
    }

    #[test]
    fn numeric_id_strips_cart_key() {
        let cart = CartId::new("gid://shopify/Cart/c1-abc?key=deadbeef");
        assert_eq!(cart.numeric_id(), "c1-abc");
    }

    #[test]
    fn numeric_id_of_plain_value_is_itself() {
        assert_eq!(CartLineId::new("line-1").numeric_id(), "line-1");
    }

    #[test]
    fn fallback_product_gid_swaps_type() {
        let variant = VariantGid::new("gid://shopify/ProductVariant/7");
        assert_eq!(
            variant.fallback_product_gid().as_str(),
            "gid://shopify/Product/7"
        );
    }

    #[test]
    fn gid_serializes_transparently() {
        let id = CartLineId::new("gid://shopify/CartLine/1");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"gid://shopify/CartLine/1\"");
    }
}
