//! Soft Shop Core - Shared types library.
//!
//! This crate provides the types shared by all Soft Shop components:
//! - `storefront` - Storage adapter, API client and the product list and
//!   checkout components
//! - `cli` - The `shop` command-line driver
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, prices, the cart, the address form and the order payload
//! - [`paths`] - Server routes the client talks to or navigates to

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod paths;
pub mod types;

pub use types::*;
