//! Storefront server API.
//!
//! # Architecture
//!
//! - [`Catalog`] and [`OrderSink`] are the seams the components depend on
//! - [`ShopClient`] implements both over HTTP with `reqwest`, and adds the
//!   session endpoints (login, logout, checkout CSRF token)
//! - Session cookies live in a cookie jar mirrored to storage, so a login
//!   survives process restarts
//!
//! # Endpoints
//!
//! - `GET /api/list?filter=&limit=&offset=` - catalog page in a `SUCCESS` envelope
//! - `POST /api/order` - JSON order, any success status accepted
//! - `POST /login`, `GET /logout` - session management
//! - `GET /checkout` - HTML page carrying `window._csrf`
//!
//! Unauthenticated requests are redirected to `/login` by the server; the
//! client reports them as [`ApiError::Unauthenticated`].

mod client;
mod session;

use std::future::Future;

use soft_shop_core::{Order, ProductPage};
use thiserror::Error;

pub use client::ShopClient;
pub use session::extract_csrf_token;

/// Errors that can occur when talking to the storefront server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("Server returned {status}: {message}")]
    Status {
        status: reqwest::StatusCode,
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The session is missing or expired; the server sent us to the login page.
    #[error("Not signed in (session missing or expired)")]
    Unauthenticated,

    /// The login form was rejected.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The checkout page carried no CSRF token.
    #[error("Checkout page did not provide a CSRF token")]
    MissingCsrfToken,

    /// Endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Parameters of a catalog request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Free-text filter, forwarded verbatim. Empty means unfiltered.
    pub filter: String,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListQuery {
    /// A first-page query for `filter`.
    #[must_use]
    pub fn filter(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            ..Self::default()
        }
    }
}

/// Source of catalog pages.
pub trait Catalog: Send + Sync + 'static {
    /// Fetch the products matching `query`.
    fn list_products(
        &self,
        query: &ListQuery,
    ) -> impl Future<Output = Result<ProductPage, ApiError>> + Send;
}

/// Destination for placed orders.
pub trait OrderSink: Send + Sync {
    /// Submit `order`. `Ok` means the server accepted it.
    fn submit_order(&self, order: &Order) -> impl Future<Output = Result<(), ApiError>> + Send;
}
