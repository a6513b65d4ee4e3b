//! Storefront deployment variants.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error parsing a [`Variant`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown storefront variant '{0}' (expected 'client' or 'public')")]
pub struct VariantError(String);

/// Which flavour of the storefront is deployed.
///
/// The two differ only in what the product list allows:
///
/// | | `Client` | `Public` |
/// |---|---|---|
/// | Add disabled when already in cart | yes | no |
/// | Remove from cart | yes | no |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Client,
    Public,
}

impl Variant {
    /// Whether adding a product already in the cart is refused.
    #[must_use]
    pub const fn dedupes_cart(self) -> bool {
        matches!(self, Self::Client)
    }

    /// Whether the product list offers a remove action.
    #[must_use]
    pub const fn supports_remove(self) -> bool {
        matches!(self, Self::Client)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Public => "public",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(Self::Client),
            "public" => Ok(Self::Public),
            _ => Err(VariantError(s.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("client".parse::<Variant>().unwrap(), Variant::Client);
        assert_eq!(" PUBLIC ".parse::<Variant>().unwrap(), Variant::Public);
        let err = "admin".parse::<Variant>().unwrap_err();
        assert!(err.to_string().contains("'admin'"));
    }

    #[test]
    fn test_capabilities() {
        assert!(Variant::Client.dedupes_cart());
        assert!(Variant::Client.supports_remove());
        assert!(!Variant::Public.dedupes_cart());
        assert!(!Variant::Public.supports_remove());
    }
}
