//! CLI command implementations.

pub mod cart;
pub mod cms;
pub mod product;
