//! Integration tests for Soft Shop.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p soft-shop-integration-tests
//! ```
//!
//! No external services are needed: each test starts a [`MockShop`] on a
//! random local port that speaks the storefront server's protocol.
//!
//! # Test Categories
//!
//! - `catalog` - Listing, filtering, paging
//! - `checkout` - Order submission through the checkout component
//! - `session` - Login, logout, cookie persistence, CSRF

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use soft_shop_core::{Price, Product, paths};
use soft_shop_storefront::api::ShopClient;
use soft_shop_storefront::config::ShopConfig;
use soft_shop_storefront::storage::StorageAdapter;
use tokio::net::TcpListener;
use url::Url;

/// Username the mock server accepts.
pub const USERNAME: &str = "alice";
/// Password the mock server accepts.
pub const PASSWORD: &str = "wonderland";

const SESSION_COOKIE: &str = "sessionId";
const SESSION_VALUE: &str = "test-session";

/// Products every mock server starts with.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    vec![
        Product::new("apple", "Apple", Price::from(1_u64)),
        Product::new(
            "apricot",
            "Apricot",
            Price::from_f64(2.5).expect("finite price"),
        ),
        Product::new("banana", "Banana", Price::from(3_u64)),
    ]
}

#[derive(Default)]
struct MockState {
    products: Vec<Product>,
    orders: Mutex<Vec<Value>>,
    list_queries: Mutex<Vec<HashMap<String, String>>>,
    reject_orders: Mutex<Option<StatusCode>>,
    csrf_issued: AtomicU64,
}

impl MockState {
    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_csrf(&self) -> String {
        format!("csrf-{}", self.csrf_issued.load(Ordering::SeqCst))
    }
}

/// A storefront server on a random local port.
///
/// Dropping it does not stop the server; it lives until the test runtime
/// shuts down.
pub struct MockShop {
    base_url: Url,
    state: Arc<MockState>,
}

impl MockShop {
    /// Start a server with [`sample_products`].
    pub async fn start() -> Self {
        Self::with_products(sample_products()).await
    }

    /// Start a server with the given catalog.
    pub async fn with_products(products: Vec<Product>) -> Self {
        let state = Arc::new(MockState {
            products,
            ..MockState::default()
        });

        let app = Router::new()
            .route(paths::API_LIST, get(list))
            .route(paths::API_ORDER, post(order))
            .route(paths::LOGIN, get(login_page).post(login))
            .route(paths::LOGOUT, get(logout))
            .route(paths::CHECKOUT, get(checkout_page))
            .route(paths::PRODUCTS, get(page))
            .route(paths::THANK_YOU, get(page))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock server failed");
        });

        Self {
            base_url: Url::parse(&format!("http://{addr}/")).expect("Invalid mock server URL"),
            state,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client configuration pointing at this server.
    #[must_use]
    pub fn config(&self) -> ShopConfig {
        ShopConfig::new(self.base_url.clone())
    }

    /// A client with no session yet.
    #[must_use]
    pub fn client(&self, storage: StorageAdapter) -> ShopClient {
        ShopClient::new(&self.config(), storage).expect("Failed to build client")
    }

    /// A client that has logged in.
    pub async fn signed_in_client(&self, storage: StorageAdapter) -> ShopClient {
        let client = self.client(storage);
        client
            .login(USERNAME, &SecretString::from(PASSWORD))
            .await
            .expect("Login failed");
        client
    }

    /// Make every following order fail with `status`.
    pub fn reject_orders_with(&self, status: StatusCode) {
        *MockState::lock(&self.state.reject_orders) = Some(status);
    }

    /// Accept orders again.
    pub fn accept_orders(&self) {
        *MockState::lock(&self.state.reject_orders) = None;
    }

    /// Order bodies accepted so far, as received.
    #[must_use]
    pub fn orders(&self) -> Vec<Value> {
        MockState::lock(&self.state.orders).clone()
    }

    /// Query parameters of every list request that reached the handler.
    #[must_use]
    pub fn list_queries(&self) -> Vec<HashMap<String, String>> {
        MockState::lock(&self.state.list_queries).clone()
    }

    /// The CSRF token the checkout page handed out last.
    #[must_use]
    pub fn current_csrf(&self) -> String {
        self.state.current_csrf()
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn is_signed_in(headers: &HeaderMap) -> bool {
    let expected = format!("{SESSION_COOKIE}={SESSION_VALUE}");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .any(|pair| pair.trim() == expected)
}

fn to_login() -> Response {
    Redirect::to(paths::LOGIN).into_response()
}

fn error_envelope(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "result": "ERROR", "message": message }))).into_response()
}

async fn list(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !is_signed_in(&headers) {
        return to_login();
    }
    MockState::lock(&state.list_queries).push(params.clone());

    let filter = params.get("filter").map(|f| f.to_lowercase()).unwrap_or_default();
    let offset = params
        .get("offset")
        .and_then(|o| o.parse::<usize>().ok())
        .unwrap_or(0);
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(usize::MAX);

    let matching: Vec<&Product> = state
        .products
        .iter()
        .filter(|p| {
            p.name.as_str().to_lowercase().contains(&filter)
                || p.title.to_lowercase().contains(&filter)
        })
        .skip(offset)
        .take(limit)
        .collect();

    // An empty result is encoded as null
    let products = if matching.is_empty() {
        Value::Null
    } else {
        json!(matching)
    };
    Json(json!({
        "result": "SUCCESS",
        "body": { "products": products, "total": state.products.len() },
    }))
    .into_response()
}

async fn order(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !is_signed_in(&headers) {
        return to_login();
    }
    if let Some(status) = *MockState::lock(&state.reject_orders) {
        return error_envelope(status, "Server error");
    }
    if body.get("csrf").and_then(Value::as_str) != Some(state.current_csrf().as_str()) {
        return error_envelope(StatusCode::FORBIDDEN, "Invalid CSRF token");
    }

    MockState::lock(&state.orders).push(body);
    (
        StatusCode::MOVED_PERMANENTLY,
        [(header::LOCATION, paths::THANK_YOU)],
    )
        .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn login_page() -> Html<&'static str> {
    Html(
        r#"<form method="post" action="/login"><input name="username"><input name="password" type="password"></form>"#,
    )
}

async fn login(Form(form): Form<LoginForm>) -> Response {
    if form.username != USERNAME || form.password != PASSWORD {
        return login_page().await.into_response();
    }
    (
        StatusCode::SEE_OTHER,
        [
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}={SESSION_VALUE}; Path=/; HttpOnly"),
            ),
            (header::LOCATION, paths::PRODUCTS.to_string()),
        ],
    )
        .into_response()
}

async fn logout() -> Response {
    (
        StatusCode::SEE_OTHER,
        [
            (
                header::SET_COOKIE,
                format!("{SESSION_COOKIE}=; Path=/; Max-Age=0"),
            ),
            (header::LOCATION, paths::LOGIN.to_string()),
        ],
    )
        .into_response()
}

async fn checkout_page(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !is_signed_in(&headers) {
        return to_login();
    }
    let issued = state.csrf_issued.fetch_add(1, Ordering::SeqCst) + 1;
    Html(format!(
        "<html><head><script>window._csrf = \"csrf-{issued}\";</script></head><body></body></html>"
    ))
    .into_response()
}

async fn page(headers: HeaderMap) -> Response {
    if !is_signed_in(&headers) {
        return to_login();
    }
    Html("<html><body></body></html>").into_response()
}
