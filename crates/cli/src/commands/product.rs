//! Product blob commands.

use std::path::Path;

use funnels_core::{ProductData, format_price};
use funnels_storefront::config::ShopifyStorefrontConfig;
use funnels_storefront::product::load_product_data;
use funnels_storefront::shopify::StorefrontClient;
use tracing::info;

/// Fetch a product by handle and write it as the static product blob.
///
/// # Errors
///
/// Returns an error if Shopify settings are missing, the product cannot be
/// fetched, or the file cannot be written.
pub async fn pull(
    handle: &str,
    out: &Path,
    store_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ShopifyStorefrontConfig::from_env()?;
    let client = StorefrontClient::new(&config);

    info!(handle, endpoint = %client.endpoint(), "Fetching product");
    let product = client.get_product_by_handle(handle, store_id).await?;

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&product)?;
    tokio::fs::write(out, json).await?;

    info!(
        title = %product.title,
        variants = product.variants.len(),
        path = %out.display(),
        "Wrote product blob"
    );
    Ok(())
}

/// One variant as `product inspect` reports it.
#[derive(Debug, PartialEq, Eq)]
pub struct VariantRow {
    pub id: String,
    pub title: String,
    pub price: String,
    pub compare_at: Option<String>,
    pub discount: u32,
    pub available: bool,
}

/// Rows for every variant, priced in the product's currency.
#[must_use]
pub fn variant_rows(product: &ProductData) -> Vec<VariantRow> {
    let currency = product.currency_code();
    product
        .variants
        .iter()
        .map(|variant| {
            let discount = variant.discount_percent();
            VariantRow {
                id: variant.id.clone(),
                title: variant.title.clone(),
                price: format_price(&variant.price, currency),
                compare_at: variant
                    .compare_at_price
                    .as_deref()
                    .filter(|_| discount > 0)
                    .map(|amount| format_price(amount, currency)),
                discount,
                available: variant.can_add_to_cart(),
            }
        })
        .collect()
}

/// Print variants, prices and discounts from a product blob.
///
/// # Errors
///
/// Returns an error if the file is missing or not a valid blob.
pub fn inspect(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let product = load_product_data(file)?
        .ok_or_else(|| format!("File not found: {}", file.display()))?;

    info!(
        title = %product.title,
        handle = product.handle.as_deref().unwrap_or("-"),
        store_id = product.store_id.as_deref().unwrap_or("default"),
        currency = product.currency_code(),
        "Product"
    );

    let rows = variant_rows(&product);
    if rows.is_empty() {
        info!("No variants available");
    }
    for row in rows {
        info!(
            id = %row.id,
            title = %row.title,
            price = %row.price,
            compare_at = row.compare_at.as_deref().unwrap_or("-"),
            discount = row.discount,
            available = row.available,
            "Variant"
        );
    }
    Ok(())
}
