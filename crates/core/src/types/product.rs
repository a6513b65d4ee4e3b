//! Catalog products and their prices.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The unique key of a product in the catalog.
///
/// Cart dedupe and remove-by-name both compare on this value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProductName(String);

impl ProductName {
    /// Create a product name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ProductName` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for ProductName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl PartialEq<str> for ProductName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ProductName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A catalog price.
///
/// The JSON number is kept exactly as the server sent it, so a cart written
/// back to storage is byte-for-byte what was read (`1` stays `1`, never
/// `1.0`). Arithmetic goes through [`Price::amount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(serde_json::Number);

impl Price {
    /// Create a price from a float. Returns `None` for NaN or infinities.
    #[must_use]
    pub fn from_f64(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self)
    }

    /// The price as a decimal amount.
    ///
    /// Returns `None` only when the number cannot be represented as a
    /// `Decimal` (out of range).
    #[must_use]
    pub fn amount(&self) -> Option<Decimal> {
        let repr = self.0.to_string();
        Decimal::from_str(&repr)
            .or_else(|_| Decimal::from_scientific(&repr))
            .ok()
    }
}

impl From<u64> for Price {
    fn from(value: u64) -> Self {
        Self(value.into())
    }
}

impl From<i64> for Price {
    fn from(value: i64) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A product as served by the catalog endpoint.
///
/// Immutable from the client's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique key.
    pub name: ProductName,
    /// Display title.
    pub title: String,
    /// Unit price.
    pub price: Price,
}

impl Product {
    /// Create a product.
    #[must_use]
    pub fn new(name: impl Into<ProductName>, title: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            price,
        }
    }
}

/// A product that has been added to the cart. There is no quantity: adding
/// the same product twice stores it twice.
pub type CartItem = Product;
