//! Delivery address form.

use serde::{Deserialize, Serialize};

/// Errors raised when an [`AddressForm`] is missing a required field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required text field is empty or whitespace.
    #[error("{field} is required")]
    Missing {
        /// Wire name of the field.
        field: &'static str,
    },
}

/// The address entered on the checkout page.
///
/// Transient: built fresh per checkout and submitted once, never persisted.
/// On the wire the street number is `streetNumber`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub city: String,
    pub area: String,
    pub code: i64,
    pub street: String,
    pub street_number: i64,
}

impl AddressForm {
    /// Check that every required text field is filled in.
    ///
    /// Numeric fields always carry a value (they start at zero).
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Missing`] for the first blank field, checked in
    /// form order: city, area, street.
    pub fn validate(&self) -> Result<(), AddressError> {
        for (field, value) in [
            ("city", &self.city),
            ("area", &self.area),
            ("street", &self.street),
        ] {
            if value.trim().is_empty() {
                return Err(AddressError::Missing { field });
            }
        }
        Ok(())
    }
}
