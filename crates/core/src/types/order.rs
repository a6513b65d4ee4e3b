//! Order submission payload.

use serde::{Deserialize, Serialize};

use super::address::AddressForm;
use super::cart::Cart;

/// Body of `POST /api/order`.
///
/// Built at submission time from the cart as currently stored, the address
/// form and the page's CSRF token. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub products: Cart,
    pub address: AddressForm,
    pub csrf: String,
}

impl Order {
    /// Assemble an order.
    #[must_use]
    pub fn new(products: Cart, address: AddressForm, csrf: impl Into<String>) -> Self {
        Self {
            products,
            address,
            csrf: csrf.into(),
        }
    }
}
