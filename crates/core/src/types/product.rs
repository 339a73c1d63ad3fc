//! The static product snapshot a landing page is generated for.
//!
//! The blob is produced once (see `funnels-cli product pull`) and read at
//! startup. Field names are snake_case on the wire, with the two
//! generator-injected fields `_storeId` and `_shopDomain`.

use serde::{Deserialize, Serialize};

use super::id::{ProductGid, VariantGid};
use super::price::discount_percent;

/// Currency used when the blob carries no price range.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A money amount as written in the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobMoney {
    pub amount: String,
    pub currency_code: String,
}

/// Minimum and maximum variant price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: BlobMoney,
    pub max: BlobMoney,
}

/// A product option such as "Color" with its values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// A variant's value for one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

/// A purchasable variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Numeric Shopify ID.
    pub id: String,
    pub gid: VariantGid,
    pub title: String,
    pub price: String,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    /// Missing means available; only an explicit `false` disables purchase.
    #[serde(default)]
    pub available_for_sale: Option<bool>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub image: Option<ProductImage>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

impl Variant {
    /// Whether the add-to-cart button should be enabled.
    #[must_use]
    pub fn can_add_to_cart(&self) -> bool {
        self.available_for_sale != Some(false)
    }

    /// Whole-percent discount against the compare-at price, or zero.
    #[must_use]
    pub fn discount_percent(&self) -> u32 {
        discount_percent(&self.price, self.compare_at_price.as_deref())
    }
}

/// The product blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductData {
    /// Numeric Shopify ID.
    pub id: String,
    pub gid: ProductGid,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub description_html: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured_image: Option<ProductImage>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(rename = "_storeId", default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(rename = "_shopDomain", default, skip_serializing_if = "Option::is_none")]
    pub shop_domain: Option<String>,
}

impl ProductData {
    /// The variant shown before the visitor picks one.
    #[must_use]
    pub fn default_variant(&self) -> Option<&Variant> {
        self.variants.first()
    }

    /// Look a variant up by numeric id or GID, falling back to the default.
    #[must_use]
    pub fn select_variant(&self, id: Option<&str>) -> Option<&Variant> {
        id.and_then(|id| {
            self.variants
                .iter()
                .find(|v| v.id == id || v.gid.as_str() == id)
        })
        .or_else(|| self.default_variant())
    }

    /// The selector is hidden entirely with zero or one variant.
    #[must_use]
    pub fn shows_variant_selector(&self) -> bool {
        self.variants.len() > 1
    }

    /// Currency of the cheapest variant, or USD.
    #[must_use]
    pub fn currency_code(&self) -> &str {
        self.price_range
            .as_ref()
            .map(|range| range.min.currency_code.as_str())
            .filter(|code| !code.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }

    /// The variant's own image, else the product's featured image.
    #[must_use]
    pub fn display_image<'a>(&'a self, variant: &'a Variant) -> Option<&'a ProductImage> {
        variant.image.as_ref().or(self.featured_image.as_ref())
    }
}
