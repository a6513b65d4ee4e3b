//! HTTP client for the storefront server.

use std::sync::Arc;

use reqwest::cookie::Jar;
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use soft_shop_core::{ApiEnvelope, Order, ProductPage, paths};
use tracing::{debug, info, instrument};
use url::Url;

use super::session::{extract_csrf_token, forget_cookies, persist_cookies, restore_cookies};
use super::{ApiError, Catalog, ListQuery, OrderSink};
use crate::config::ShopConfig;
use crate::storage::StorageAdapter;

/// How much of an unexpected body to keep in logs and errors.
const BODY_SNIPPET_LEN: usize = 200;

/// Client for the storefront server's API and session endpoints.
///
/// Cheaply cloneable; clones share the connection pool and cookie jar.
#[derive(Clone)]
pub struct ShopClient {
    inner: Arc<ShopClientInner>,
}

struct ShopClientInner {
    client: reqwest::Client,
    base_url: Url,
    jar: Arc<Jar>,
    storage: StorageAdapter,
    list_limit: Option<u32>,
}

impl ShopClient {
    /// Create a client, restoring any session saved in `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g., TLS backend
    /// initialization fails).
    pub fn new(config: &ShopConfig, storage: StorageAdapter) -> Result<Self, ApiError> {
        let base_url = with_trailing_slash(config.base_url.clone());
        let jar = Arc::new(Jar::default());
        restore_cookies(&jar, &storage, &base_url);

        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopClientInner {
                client,
                base_url,
                jar,
                storage,
                list_limit: config.list_limit,
            }),
        })
    }

    /// The URL of a server route such as [`paths::PRODUCTS`], kept under
    /// the base URL's path prefix.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Url`] if the path does not form a valid URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Whether `response` ended on the login page, after redirects.
    fn landed_on_login(&self, response: &Response) -> Result<bool, ApiError> {
        Ok(response.url().path() == self.endpoint(paths::LOGIN)?.path())
    }

    /// Detect the server's redirect of unauthenticated requests to the login
    /// page.
    fn ensure_authenticated(&self, response: &Response) -> Result<(), ApiError> {
        if self.landed_on_login(response)? {
            return Err(ApiError::Unauthenticated);
        }
        Ok(())
    }

    /// Build the list endpoint URL for `query`.
    ///
    /// The filter is always sent, even when empty. The configured page size
    /// applies when the query does not set one.
    fn list_url(&self, query: &ListQuery) -> Result<Url, ApiError> {
        let mut url = self.endpoint(paths::API_LIST)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("filter", &query.filter);
            if let Some(limit) = query.limit.or(self.inner.list_limit) {
                pairs.append_pair("limit", &limit.to_string());
            }
            if let Some(offset) = query.offset {
                pairs.append_pair("offset", &offset.to_string());
            }
        }
        Ok(url)
    }

    /// Fetch a catalog page.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, an
    /// `ERROR` envelope, an unparseable body, or a redirect to the login page.
    #[instrument(skip(self), fields(filter = %query.filter))]
    pub async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, ApiError> {
        let url = self.list_url(query)?;
        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        self.ensure_authenticated(&response)?;

        let body = response.text().await?;
        let envelope: ApiEnvelope<ProductPage> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Status {
                    status,
                    message: snippet(&body),
                });
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %snippet(&body),
                    "Failed to parse catalog response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        let page = envelope
            .into_result()
            .map_err(|message| ApiError::Status { status, message })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: String::new(),
            });
        }

        debug!(shown = page.shown(), total = page.total, "Fetched catalog page");
        Ok(page)
    }

    /// Post an order.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a
    /// redirect to the login page.
    #[instrument(skip_all, fields(items = order.products.len()))]
    pub async fn submit_order(&self, order: &Order) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(paths::API_ORDER)?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(order)
            .send()
            .await?;
        self.ensure_authenticated(&response)?;
        ensure_success(response).await?;

        info!("Order accepted");
        Ok(())
    }

    /// Sign in with the login form and save the session cookies.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidCredentials`] if the server shows the login
    /// page again, or an HTTP error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(paths::LOGIN)?)
            .form(&[("username", username), ("password", password.expose_secret())])
            .send()
            .await?;

        if self.landed_on_login(&response)? {
            return Err(ApiError::InvalidCredentials);
        }
        ensure_success(response).await?;

        persist_cookies(&self.inner.jar, &self.inner.storage, &self.inner.base_url);
        info!("Signed in");
        Ok(())
    }

    /// End the server session and forget the saved cookies.
    ///
    /// # Errors
    ///
    /// Returns an HTTP error if the server could not be reached; the local
    /// session is forgotten regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        forget_cookies(&self.inner.storage);
        self.inner
            .client
            .get(self.endpoint(paths::LOGOUT)?)
            .send()
            .await?;
        info!("Signed out");
        Ok(())
    }

    /// Load the checkout page and read the CSRF token it carries.
    ///
    /// Every visit issues a fresh token server-side; only the latest one is
    /// accepted with an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] without a session,
    /// [`ApiError::MissingCsrfToken`] if the page has no token, or an HTTP
    /// error.
    #[instrument(skip(self))]
    pub async fn checkout_csrf_token(&self) -> Result<SecretString, ApiError> {
        let response = self
            .inner
            .client
            .get(self.endpoint(paths::CHECKOUT)?)
            .send()
            .await?;
        self.ensure_authenticated(&response)?;
        let html = ensure_success(response).await?.text().await?;

        // The session cookie may have been refreshed
        persist_cookies(&self.inner.jar, &self.inner.storage, &self.inner.base_url);

        extract_csrf_token(&html)
            .map(SecretString::from)
            .ok_or(ApiError::MissingCsrfToken)
    }
}

impl Catalog for ShopClient {
    async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, ApiError> {
        Self::list_products(self, query).await
    }
}

impl OrderSink for ShopClient {
    async fn submit_order(&self, order: &Order) -> Result<(), ApiError> {
        Self::submit_order(self, order).await
    }
}

/// Relative joins replace the last path segment unless it ends in `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Turn a non-success status into [`ApiError::Status`], using the envelope's
/// message when the body has one.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|envelope| envelope.into_result().err())
        .unwrap_or_else(|| snippet(&body));

    tracing::warn!(status = %status, message = %message, "Server returned non-success status");
    Err(ApiError::Status { status, message })
}

fn snippet(body: &str) -> String {
    body.trim().chars().take(BODY_SNIPPET_LEN).collect()
}

/// Shorthand used by tests and callers that need an HTTP-status failure
/// without a response.
impl From<StatusCode> for ApiError {
    fn from(status: StatusCode) -> Self {
        Self::Status {
            status,
            message: status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        }
    }
}
