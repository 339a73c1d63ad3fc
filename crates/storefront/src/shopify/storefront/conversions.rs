//! Conversions from raw GraphQL response shapes to domain types.

use funnels_core::{
    BlobMoney, CartId, CartLineId, PriceRange, ProductData, ProductGid, ProductImage,
    ProductOption, SelectedOption, Variant, VariantGid,
};
use tracing::warn;

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartLineCost, CartMerchandise, CartUserError, Money,
};

use super::queries::{
    CartFields, CartLineNode, MoneyV2, UserErrorFields, get_product_by_handle,
};

// =============================================================================
// Cart
// =============================================================================

pub fn convert_money(money: MoneyV2) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

pub fn convert_cart(cart: CartFields) -> Cart {
    Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        lines: cart
            .lines
            .edges
            .into_iter()
            .filter_map(|edge| convert_cart_line(edge.node))
            .collect(),
        cost: CartCost {
            total_amount: convert_money(cart.cost.total_amount),
            subtotal_amount: convert_money(cart.cost.subtotal_amount),
        },
    }
}

/// Lines whose merchandise is not a product variant are skipped.
fn convert_cart_line(node: CartLineNode) -> Option<CartLine> {
    let merchandise = node.merchandise;
    let (Some(id), Some(price)) = (merchandise.id, merchandise.price) else {
        warn!(line_id = %node.id, "Skipping cart line without variant merchandise");
        return None;
    };

    Some(CartLine {
        id: CartLineId::new(node.id),
        quantity: node.quantity,
        merchandise: CartMerchandise {
            id: VariantGid::new(id),
            title: merchandise.title.unwrap_or_default(),
            product_title: merchandise.product.map(|p| p.title).unwrap_or_default(),
            price: convert_money(price),
            compare_at_price: merchandise.compare_at_price.map(convert_money),
            image_url: merchandise.image.map(|i| i.url),
        },
        cost: CartLineCost {
            total_amount: convert_money(node.cost.total_amount),
            amount_per_quantity: node.cost.amount_per_quantity.map(convert_money),
            compare_at_amount_per_quantity: node
                .cost
                .compare_at_amount_per_quantity
                .map(convert_money),
        },
    })
}

pub fn convert_user_error(error: UserErrorFields) -> CartUserError {
    CartUserError {
        code: error.code,
        field: error.field,
        message: error.message,
    }
}

// =============================================================================
// Product blob
// =============================================================================

fn convert_image(image: get_product_by_handle::Image) -> ProductImage {
    ProductImage {
        src: image.url,
        alt: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

fn convert_blob_money(money: MoneyV2) -> BlobMoney {
    BlobMoney {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

fn convert_variant(variant: get_product_by_handle::Variant) -> Variant {
    let gid = VariantGid::new(variant.id);
    Variant {
        id: gid.numeric_id().to_string(),
        gid,
        title: variant.title,
        price: variant.price.amount,
        compare_at_price: variant.compare_at_price.map(|m| m.amount),
        sku: variant.sku,
        barcode: variant.barcode,
        available_for_sale: Some(variant.available_for_sale),
        inventory_quantity: variant.quantity_available,
        image: variant.image.map(convert_image),
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
    }
}

/// Build the static product blob from a Storefront API product.
pub fn convert_product(
    product: get_product_by_handle::Product,
    store_id: Option<String>,
    shop_domain: Option<String>,
) -> ProductData {
    let gid = ProductGid::new(product.id);
    let non_empty = |s: String| (!s.is_empty()).then_some(s);

    ProductData {
        id: gid.numeric_id().to_string(),
        gid,
        title: product.title,
        handle: non_empty(product.handle),
        vendor: non_empty(product.vendor),
        product_type: non_empty(product.product_type),
        description: non_empty(product.description),
        description_html: non_empty(product.description_html),
        tags: product.tags,
        featured_image: product.featured_image.map(convert_image),
        images: product
            .images
            .edges
            .into_iter()
            .map(|e| convert_image(e.node))
            .collect(),
        price_range: Some(PriceRange {
            min: convert_blob_money(product.price_range.min_variant_price),
            max: convert_blob_money(product.price_range.max_variant_price),
        }),
        options: product
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
        variants: product
            .variants
            .edges
            .into_iter()
            .map(|e| convert_variant(e.node))
            .collect(),
        store_id,
        shop_domain,
    }
}
