//! The landing page product: loading the static blob and preparing it for
//! display.

use std::path::Path;

use funnels_core::{ProductData, Variant, discount_percent, format_price};
use thiserror::Error;

use crate::cart::{ButtonItem, ButtonState};

/// Shown when the product has no variants.
pub const NO_VARIANTS: &str = "No variants available";

/// Shown when no product blob is configured.
pub const NO_PRODUCT: &str = "No product configured.";

/// Errors loading the product blob.
#[derive(Debug, Error)]
pub enum ProductDataError {
    #[error("Failed to read product data {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid product data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load the product blob.
///
/// A missing file is `Ok(None)`: the page renders without a product.
///
/// # Errors
///
/// Returns `ProductDataError` if the file exists but cannot be read or parsed.
pub fn load_product_data(path: &Path) -> Result<Option<ProductData>, ProductDataError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ProductDataError::Read {
                path: path.display().to_string(),
                source,
            });
        }
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

// =============================================================================
// Views
// =============================================================================

/// An image for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub src: String,
    pub alt: String,
}

/// A variant selector option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOptionView {
    pub id: String,
    pub title: String,
    pub selected: bool,
    pub disabled: bool,
}

/// The product as displayed with one variant selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductView {
    pub title: String,
    pub vendor: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageView>,
    pub variant_id: String,
    pub variant_gid: String,
    pub price: String,
    /// Set only when the variant is discounted.
    pub compare_at_price: Option<String>,
    pub discount: u32,
    /// Empty when the selector is hidden.
    pub options: Vec<VariantOptionView>,
    pub button: ButtonState,
}

impl ProductView {
    /// Display `product` with the variant matching `variant` (numeric id or
    /// GID) selected, else the first.
    ///
    /// Returns `None` when there are no variants.
    #[must_use]
    pub fn build(product: &ProductData, variant: Option<&str>) -> Option<Self> {
        let selected = product.select_variant(variant)?;
        Some(Self::with_button(
            product,
            selected,
            ButtonItem::from_variant(product, selected).initial_state(),
        ))
    }

    /// Display `selected` with the button in `button` state.
    #[must_use]
    pub fn with_button(product: &ProductData, selected: &Variant, button: ButtonState) -> Self {
        let currency = product.currency_code();
        let discount = discount_percent(&selected.price, selected.compare_at_price.as_deref());
        let compare_at_price = selected
            .compare_at_price
            .as_deref()
            .filter(|_| discount > 0)
            .map(|amount| format_price(amount, currency));

        let options = if product.shows_variant_selector() {
            product
                .variants
                .iter()
                .map(|variant| VariantOptionView {
                    id: variant.id.clone(),
                    title: variant.title.clone(),
                    selected: variant.id == selected.id,
                    disabled: !variant.can_add_to_cart(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            title: product.title.clone(),
            vendor: product.vendor.clone().filter(|v| !v.is_empty()),
            description: product.description.clone().filter(|d| !d.is_empty()),
            image: product.display_image(selected).map(|image| ImageView {
                src: image.src.clone(),
                alt: image
                    .alt
                    .clone()
                    .filter(|alt| !alt.is_empty())
                    .unwrap_or_else(|| product.title.clone()),
            }),
            variant_id: selected.id.clone(),
            variant_gid: selected.gid.as_str().to_string(),
            price: format_price(&selected.price, currency),
            compare_at_price,
            discount,
            options,
            button,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnels_core::{BlobMoney, PriceRange, ProductGid, ProductImage, VariantGid};

    fn variant(id: &str, price: &str, compare_at: Option<&str>, available: Option<bool>) -> Variant {
        Variant {
            id: id.to_string(),
            gid: VariantGid::new(format!("gid://shopify/ProductVariant/{id}")),
            title: format!("V{id}"),
            price: price.to_string(),
            compare_at_price: compare_at.map(str::to_string),
            sku: None,
            barcode: None,
            available_for_sale: available,
            inventory_quantity: None,
            image: None,
            selected_options: Vec::new(),
        }
    }

    fn product(variants: Vec<Variant>) -> ProductData {
        ProductData {
            id: "7".to_string(),
            gid: ProductGid::new("gid://shopify/Product/7"),
            title: "Snowboard".to_string(),
            handle: None,
            vendor: Some("Vendor".to_string()),
            product_type: None,
            description: None,
            description_html: None,
            tags: Vec::new(),
            featured_image: Some(ProductImage {
                src: "https://cdn.example/main.jpg".to_string(),
                alt: None,
                width: None,
                height: None,
            }),
            images: Vec::new(),
            price_range: Some(PriceRange {
                min: BlobMoney {
                    amount: "29.99".to_string(),
                    currency_code: "EUR".to_string(),
                },
                max: BlobMoney {
                    amount: "39.99".to_string(),
                    currency_code: "EUR".to_string(),
                },
            }),
            options: Vec::new(),
            variants,
            store_id: None,
            shop_domain: None,
        }
    }

    #[test]
    fn discounted_variant_shows_badge_and_compare_at() {
        let product = product(vec![variant("1", "29.99", Some("39.99"), Some(true))]);
        let view = ProductView::build(&product, None).unwrap_or_else(|| panic!("no view"));

        assert_eq!(view.discount, 25);
        assert_eq!(view.price, "€29.99");
        assert_eq!(view.compare_at_price.as_deref(), Some("€39.99"));
        assert!(view.options.is_empty());
        assert_eq!(view.button, ButtonState::Idle);
    }

    #[test]
    fn compare_at_not_above_price_is_hidden() {
        let product = product(vec![variant("1", "39.99", Some("39.99"), None)]);
        let view = ProductView::build(&product, None).unwrap_or_else(|| panic!("no view"));

        assert_eq!(view.discount, 0);
        assert_eq!(view.compare_at_price, None);
    }

    #[test]
    fn selector_lists_variants_and_disables_unavailable() {
        let product = product(vec![
            variant("1", "10", None, Some(true)),
            variant("2", "10", None, Some(false)),
        ]);
        let view = ProductView::build(&product, Some("2")).unwrap_or_else(|| panic!("no view"));

        assert_eq!(view.options.len(), 2);
        assert!(view.options[1].selected);
        assert!(view.options[1].disabled);
        assert!(!view.options[0].disabled);
        assert_eq!(view.button, ButtonState::Disabled);
    }

    #[test]
    fn image_falls_back_to_featured_with_title_alt() {
        let product = product(vec![variant("1", "10", None, None)]);
        let view = ProductView::build(&product, None).unwrap_or_else(|| panic!("no view"));
        let image = view.image.unwrap_or_else(|| panic!("no image"));

        assert_eq!(image.src, "https://cdn.example/main.jpg");
        assert_eq!(image.alt, "Snowboard");
    }

    #[test]
    fn no_variants_has_no_view() {
        assert!(ProductView::build(&product(Vec::new()), None).is_none());
    }

    #[test]
    fn missing_blob_is_none() {
        let loaded = load_product_data(Path::new("/nonexistent/product.json"));
        assert!(matches!(loaded, Ok(None)));
    }

    #[test]
    fn sample_blob_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("content/product.json");
        let product = load_product_data(&path)
            .ok()
            .flatten()
            .unwrap_or_else(|| panic!("sample blob missing"));
        assert!(!product.variants.is_empty());
        assert!(product.store_id.is_some());
    }
}
