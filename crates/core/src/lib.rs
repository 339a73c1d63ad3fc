//! Funnels Core - Shared types library.
//!
//! This crate provides common types used across the funnels components:
//! - `storefront` - The landing page server and cart logic
//! - `cli` - Command-line tools for producing and checking page inputs
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shopify GIDs, price formatting and the product blob

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
