//! Core types for the funnels storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod price;
pub mod product;

pub use id::*;
pub use price::{CurrencyCode, Price, discount_percent, format_price, parse_amount};
pub use product::*;
