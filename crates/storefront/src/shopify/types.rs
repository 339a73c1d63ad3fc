//! Domain types for the Shopify Storefront API cart.
//!
//! These types provide a clean, ergonomic API separate from the raw GraphQL
//! response shapes in `storefront::queries`. They are also the payload of the
//! `cart-updated` page event, so they serialize to JSON.

use funnels_core::{CartId, CartLineId, VariantGid, format_price};
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Format for display (e.g., `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        format_price(&self.amount, &self.currency_code)
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// The variant a cart line refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: VariantGid,
    /// Variant title.
    pub title: String,
    /// Parent product title.
    pub product_title: String,
    /// Current unit price.
    pub price: Money,
    /// Compare-at unit price.
    pub compare_at_price: Option<Money>,
    /// Variant image URL.
    pub image_url: Option<String>,
}

/// Cost for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Line total.
    pub total_amount: Money,
    /// Price per unit.
    pub amount_per_quantity: Option<Money>,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity.
    pub quantity: i64,
    /// Product variant.
    pub merchandise: CartMerchandise,
    /// Line cost.
    pub cost: CartLineCost,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Total amount.
    pub total_amount: Money,
    /// Subtotal before tax/shipping.
    pub subtotal_amount: Money,
}

/// A Shopify cart. Only the first ten lines are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Line items.
    pub lines: Vec<CartLine>,
    /// Cost summary.
    pub cost: CartCost,
}

impl Cart {
    /// Sum of quantities over lines with a positive quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        let total: i64 = self
            .lines
            .iter()
            .map(|line| line.quantity)
            .filter(|&quantity| quantity > 0)
            .sum();
        u32::try_from(total).unwrap_or(u32::MAX)
    }

    /// Lines worth showing; zero-quantity lines are hidden.
    pub fn visible_lines(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|line| line.quantity > 0)
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Input for adding a line to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: VariantGid,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity.
    pub quantity: i64,
}

/// User error from a cart mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}
