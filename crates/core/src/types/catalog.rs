//! Catalog endpoint response types.

use serde::{Deserialize, Deserializer, Serialize};

use super::product::Product;

/// Deserialize `null` as the type's default (the server encodes an empty
/// result set as `null`).
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the catalog, as returned in the envelope's `body`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Products matching the filter, first page only.
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<Product>,
    /// Catalog size reported by the server.
    #[serde(default)]
    pub total: u64,
}

impl ProductPage {
    /// Number of products on this page.
    #[must_use]
    pub fn shown(&self) -> usize {
        self.products.len()
    }
}

/// The server's JSON response envelope.
///
/// ```json
/// { "result": "SUCCESS", "body": { ... } }
/// { "result": "ERROR", "message": "Server error" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiEnvelope<T> {
    Success { body: T },
    Error { message: String },
}

impl<T> ApiEnvelope<T> {
    /// Convert into a `Result`, the error carrying the server's message.
    ///
    /// # Errors
    ///
    /// Returns the server's message for an `ERROR` envelope.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success { body } => Ok(body),
            Self::Error { message } => Err(message),
        }
    }
}
