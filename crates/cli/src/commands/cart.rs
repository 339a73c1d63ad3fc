//! Cart inspection.

use funnels_storefront::cart::cart_permalink;
use funnels_storefront::config::ShopifyStorefrontConfig;
use funnels_storefront::shopify::StorefrontClient;
use tracing::info;

/// Fetch a cart and print its lines, totals and checkout permalink.
///
/// # Errors
///
/// Returns an error if Shopify settings are missing or the cart cannot be
/// fetched.
pub async fn show(cart_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ShopifyStorefrontConfig::from_env()?;
    let client = StorefrontClient::new(&config);
    let cart = client.get_cart(cart_id).await?;

    info!(id = %cart.id, items = cart.item_count(), "Cart");
    for line in &cart.lines {
        info!(
            line = %line.id,
            product = %line.merchandise.product_title,
            variant = %line.merchandise.title,
            quantity = line.quantity,
            price = %line.merchandise.price.display(),
            "Line"
        );
    }
    info!(
        subtotal = %cart.cost.subtotal_amount.display(),
        total = %cart.cost.total_amount.display(),
        "Totals"
    );
    info!(
        permalink = %cart_permalink(&config.store, config.public_token(), &cart),
        checkout_url = %cart.checkout_url,
        "Checkout"
    );
    Ok(())
}
