//! Soft Shop storefront client library.
//!
//! # Architecture
//!
//! - [`storage`] - Persistent key-value storage behind an injectable trait
//! - [`cart`] - The cart under the `"cart"` key, absent read as empty
//! - [`api`] - HTTP client for the storefront server
//! - [`components`] - Product list and checkout, driven by user events
//! - [`config`] - Environment configuration
//! - [`error`] - Unified error type with Sentry integration
//!
//! The two components share nothing but storage. A driver (the `shop` CLI,
//! or a test) builds one [`storage::StorageAdapter`], hands clones of it to
//! each component, and feeds them events.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod components;
pub mod config;
pub mod error;
pub mod storage;
