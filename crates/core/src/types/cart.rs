//! The cart: an ordered, persisted sequence of cart items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::product::{CartItem, ProductName};

/// An ordered sequence of [`CartItem`]s.
///
/// Serializes as a bare JSON array, which is the format stored under the
/// `"cart"` key. Duplicates are allowed; whether they can arise is decided by
/// the storefront variant, not by the cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(Vec<CartItem>);

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// The items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.0
    }

    /// Number of entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.0.iter()
    }

    /// Append an item at the end.
    pub fn push(&mut self, item: CartItem) {
        self.0.push(item);
    }

    /// Whether an item with this name is present.
    #[must_use]
    pub fn contains(&self, name: &ProductName) -> bool {
        self.0.iter().any(|item| &item.name == name)
    }

    /// Remove every item with this name, keeping the order of the rest.
    ///
    /// Returns how many entries were removed. Removing a name that is not
    /// present is a no-op.
    pub fn remove_named(&mut self, name: &ProductName) -> usize {
        let before = self.0.len();
        self.0.retain(|item| &item.name != name);
        before - self.0.len()
    }

    /// Sum of item prices.
    ///
    /// Prices that cannot be represented as a decimal are skipped.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.0.iter().filter_map(|item| item.price.amount()).sum()
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Cart {
    type Item = CartItem;
    type IntoIter = std::vec::IntoIter<CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
