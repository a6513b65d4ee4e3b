//! Core types for Soft Shop.
//!
//! This module provides type-safe wrappers for the storefront's domain concepts.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod product;
pub mod variant;

pub use address::{AddressError, AddressForm};
pub use cart::Cart;
pub use catalog::{ApiEnvelope, ProductPage};
pub use order::Order;
pub use product::{CartItem, Price, Product, ProductName};
pub use variant::{Variant, VariantError};
