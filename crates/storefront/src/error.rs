//! Unified error handling with Sentry integration.
//!
//! Provides a unified `StorefrontError` type for drivers of the components.
//! Component operations that the storefront treats as recoverable (a failed
//! catalog fetch, a failed order) do not surface here; they are logged and
//! reflected in component state instead.

use thiserror::Error;

use crate::api::ApiError;
use crate::components::{CheckoutError, ListError};
use crate::config::ConfigError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storefront server request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout action was not valid in the current state.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Product list action was not valid for this storefront.
    #[error("Product list error: {0}")]
    List(#[from] ListError),

    /// The server did not accept the order.
    #[error("Order failed: {0}")]
    OrderFailed(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input from the user.
    #[error("Bad input: {0}")]
    BadInput(String),

    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorefrontError {
    /// Whether the error points at the server or the environment rather than
    /// at something the user can correct.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Api(err) => !matches!(
                err,
                ApiError::Unauthenticated | ApiError::InvalidCredentials
            ),
            Self::Io(_) | Self::OrderFailed(_) => true,
            _ => false,
        }
    }

    /// Log the error, capturing server errors to Sentry.
    pub fn report(&self) {
        if self.is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        } else {
            tracing::warn!(error = %self, "Command error");
        }
    }
}

/// Result type alias for `StorefrontError`.
pub type Result<T> = std::result::Result<T, StorefrontError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product", "apple")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
