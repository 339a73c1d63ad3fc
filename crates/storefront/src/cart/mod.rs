//! Cart: Shopify operations, the per-visitor state store, and the drawer,
//! badge and add-to-cart button built on them.

pub mod button;
pub mod drawer;
pub mod service;
pub mod store;

pub use button::{ADDED_RESET, AddToCartButton, ButtonItem, ButtonState};
pub use drawer::{
    CartItemView, CartView, DrawerState, badge_label, change_quantity, checkout_target,
};
pub use service::{CART_NOT_FOUND, CartResponse, CartService, NO_ACTIVE_CART, cart_permalink};
pub use store::{CartState, CartStore};
