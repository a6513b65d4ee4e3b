//! Product list: catalog search and add/remove to cart.
//!
//! # Search
//!
//! Each filter edit restarts a quiet period ([`ListSettings::debounce`]).
//! Only an edit that is still the latest when its quiet period ends issues a
//! request. Requests are never cancelled; instead each one takes a sequence
//! number and its response is applied only if no newer request has been
//! issued meanwhile, so a slow response can never overwrite a fresher one.
//!
//! Fetch failures are logged and leave the current products in place.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use soft_shop_core::{Cart, Product, ProductName, ProductPage, Variant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{Catalog, ListQuery};
use crate::cart::CartStore;
use crate::config::ShopConfig;

/// Errors from product list actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListError {
    /// This storefront variant has no remove action.
    #[error("removing items is not available on this storefront")]
    RemoveUnsupported,
}

/// Result of an add-to-cart action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// The product was appended; the cart as now stored.
    Added(Cart),
    /// The Add control is disabled for this product: it is already in the cart.
    AlreadyInCart,
}

/// Behaviour knobs for the product list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSettings {
    pub variant: Variant,
    /// Quiet period after the last filter edit before searching.
    pub debounce: Duration,
    /// Page size forwarded to the catalog.
    pub list_limit: Option<u32>,
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            debounce: Duration::from_millis(400),
            list_limit: None,
        }
    }
}

impl From<&ShopConfig> for ListSettings {
    fn from(config: &ShopConfig) -> Self {
        Self {
            variant: config.variant,
            debounce: config.search_debounce,
            list_limit: config.list_limit,
        }
    }
}

#[derive(Debug, Default)]
struct ListView {
    filter: String,
    products: Vec<Product>,
    total: u64,
    /// Bumped on every filter edit.
    edits: u64,
    /// Sequence number of the most recently issued request.
    issued: u64,
}

struct Inner<C> {
    catalog: C,
    cart: CartStore,
    settings: ListSettings,
    view: Mutex<ListView>,
}

impl<C: Catalog> Inner<C> {
    fn view(&self) -> MutexGuard<'_, ListView> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch with the current filter and apply the result unless a newer
    /// request was issued while this one was in flight.
    async fn fetch(&self) {
        let (seq, query) = {
            let mut view = self.view();
            view.issued += 1;
            let query = ListQuery {
                filter: view.filter.clone(),
                limit: self.settings.list_limit,
                offset: None,
            };
            (view.issued, query)
        };

        match self.catalog.list_products(&query).await {
            Ok(page) => self.apply(seq, &query.filter, page),
            Err(error) => {
                warn!(%error, filter = %query.filter, "Error fetching products");
            }
        }
    }

    fn apply(&self, seq: u64, filter: &str, page: ProductPage) {
        let mut view = self.view();
        if view.issued != seq {
            debug!(
                seq,
                latest = view.issued,
                filter,
                "Discarding response superseded by a newer request"
            );
            return;
        }
        debug!(seq, filter, shown = page.shown(), total = page.total, "Applying catalog page");
        view.products = page.products;
        view.total = page.total;
    }
}

/// The product list component.
///
/// Cheaply cloneable; clones share state.
pub struct ProductList<C> {
    inner: Arc<Inner<C>>,
}

impl<C> Clone for ProductList<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Catalog> ProductList<C> {
    #[must_use]
    pub fn new(catalog: C, cart: CartStore, settings: ListSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog,
                cart,
                settings,
                view: Mutex::new(ListView::default()),
            }),
        }
    }

    /// Mount the list: seed the filter from the page URL's `filter` query
    /// parameter (if present and non-empty) and load the first page.
    pub async fn mount(&self, page_url: Option<&Url>) {
        if let Some(filter) = page_url.and_then(filter_from_url) {
            self.inner.view().filter = filter;
        }
        self.inner.fetch().await;
    }

    /// Record a filter edit and schedule the debounced search.
    ///
    /// The returned task finishes once the edit has either been superseded or
    /// its search has completed. Dropping the handle does not cancel it.
    pub fn set_filter(&self, filter: impl Into<String>) -> JoinHandle<()> {
        let edit = {
            let mut view = self.inner.view();
            view.filter = filter.into();
            view.edits += 1;
            view.edits
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(inner.settings.debounce).await;
            let superseded = inner.view().edits != edit;
            if superseded {
                return;
            }
            inner.fetch().await;
        })
    }

    /// Re-run the search for the current filter immediately.
    pub async fn refresh(&self) {
        self.inner.fetch().await;
    }

    #[must_use]
    pub fn filter(&self) -> String {
        self.inner.view().filter.clone()
    }

    /// Products from the latest applied response.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.inner.view().products.clone()
    }

    /// Catalog size reported by the server.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.inner.view().total
    }

    /// The cart as currently stored.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.inner.cart.load()
    }

    /// Whether the Add control is enabled for `product`.
    #[must_use]
    pub fn can_add(&self, product: &Product) -> bool {
        !self.inner.settings.variant.dedupes_cart() || !self.cart().contains(&product.name)
    }

    /// Append `product` to the stored cart.
    ///
    /// On the client variant this is refused when an item with the same
    /// name is already stored.
    pub fn add_to_cart(&self, product: &Product) -> AddOutcome {
        if !self.can_add(product) {
            info!(product = %product.name, "Already in cart, not adding");
            return AddOutcome::AlreadyInCart;
        }
        AddOutcome::Added(self.inner.cart.append(product.clone()))
    }

    /// Remove every item named `name` from the stored cart.
    ///
    /// # Errors
    ///
    /// Returns [`ListError::RemoveUnsupported`] on the public variant.
    pub fn remove_from_cart(&self, name: &ProductName) -> Result<Cart, ListError> {
        if !self.inner.settings.variant.supports_remove() {
            return Err(ListError::RemoveUnsupported);
        }
        Ok(self.inner.cart.remove_named(name))
    }
}

/// The non-empty `filter` query parameter of a page URL.
fn filter_from_url(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "filter")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::StorageAdapter;
    use reqwest::StatusCode;
    use soft_shop_core::Price;
    use std::collections::HashMap;

    /// Catalog fake: filters by substring of the name, records every query,
    /// and can delay or fail per filter.
    #[derive(Clone, Default)]
    struct FakeCatalog {
        products: Vec<Product>,
        delays: HashMap<String, Duration>,
        failing: Vec<String>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeCatalog {
        fn with_products(names: &[&str]) -> Self {
            Self {
                products: names.iter().map(|n| product(n)).collect(),
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Catalog for FakeCatalog {
        async fn list_products(&self, query: &ListQuery) -> Result<ProductPage, ApiError> {
            self.requests.lock().unwrap().push(query.filter.clone());
            if let Some(delay) = self.delays.get(&query.filter) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing.contains(&query.filter) {
                return Err(ApiError::from(StatusCode::INTERNAL_SERVER_ERROR));
            }
            let products: Vec<Product> = self
                .products
                .iter()
                .filter(|p| p.name.as_str().contains(query.filter.as_str()))
                .cloned()
                .collect();
            Ok(ProductPage {
                products,
                total: self.products.len() as u64,
            })
        }
    }

    fn product(name: &str) -> Product {
        Product::new(name, name.to_uppercase(), Price::from(1_u64))
    }

    fn names(products: &[Product]) -> Vec<String> {
        products.iter().map(|p| p.name.to_string()).collect()
    }

    fn list(catalog: FakeCatalog, variant: Variant) -> ProductList<FakeCatalog> {
        ProductList::new(
            catalog,
            CartStore::new(StorageAdapter::in_memory()),
            ListSettings {
                variant,
                ..ListSettings::default()
            },
        )
    }

    #[tokio::test]
    async fn test_mount_loads_unfiltered_catalog() {
        let catalog = FakeCatalog::with_products(&["apple", "banana"]);
        let list = list(catalog.clone(), Variant::Client);

        list.mount(None).await;

        assert_eq!(catalog.requests(), [""]);
        assert_eq!(names(&list.products()), ["apple", "banana"]);
        assert_eq!(list.total(), 2);
    }

    #[tokio::test]
    async fn test_mount_seeds_filter_from_url() {
        let catalog = FakeCatalog::with_products(&["apple", "banana"]);
        let list = list(catalog.clone(), Variant::Client);
        let url = Url::parse("http://shop.test/products?filter=ban").unwrap();

        list.mount(Some(&url)).await;

        assert_eq!(list.filter(), "ban");
        assert_eq!(catalog.requests(), ["ban"]);
        assert_eq!(names(&list.products()), ["banana"]);
    }

    #[tokio::test]
    async fn test_mount_ignores_empty_filter_param() {
        let catalog = FakeCatalog::with_products(&["apple"]);
        let list = list(catalog.clone(), Variant::Client);
        let url = Url::parse("http://shop.test/products?filter=").unwrap();

        list.mount(Some(&url)).await;

        assert_eq!(list.filter(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_products() {
        let mut catalog = FakeCatalog::with_products(&["apple", "banana"]);
        catalog.failing.push("boom".to_string());
        let list = list(catalog, Variant::Client);
        list.mount(None).await;

        list.set_filter("boom").await.unwrap();

        assert_eq!(names(&list.products()), ["apple", "banana"]);
        assert_eq!(list.filter(), "boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_edits_issue_one_request() {
        let catalog = FakeCatalog::with_products(&["apple", "apricot", "banana"]);
        let list = list(catalog.clone(), Variant::Client);

        let first = list.set_filter("a");
        tokio::time::advance(Duration::from_millis(100)).await;
        let second = list.set_filter("ap");
        tokio::time::advance(Duration::from_millis(100)).await;
        let third = list.set_filter("app");

        first.await.unwrap();
        second.await.unwrap();
        third.await.unwrap();

        assert_eq!(catalog.requests(), ["app"]);
        assert_eq!(names(&list.products()), ["apple"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_edits_outside_window_each_search() {
        let catalog = FakeCatalog::with_products(&["apple", "banana"]);
        let list = list(catalog.clone(), Variant::Client);

        list.set_filter("a").await.unwrap();
        list.set_filter("b").await.unwrap();

        assert_eq!(catalog.requests(), ["a", "b"]);
        assert_eq!(names(&list.products()), ["banana"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let mut catalog = FakeCatalog::with_products(&["slowpoke", "fast"]);
        catalog
            .delays
            .insert("slow".to_string(), Duration::from_millis(1_000));
        catalog
            .delays
            .insert("fast".to_string(), Duration::from_millis(10));
        let list = list(catalog.clone(), Variant::Client);

        let slow = list.set_filter("slow");
        // Wait until the slow request is actually in flight
        while catalog.requests().is_empty() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        let fast = list.set_filter("fast");

        fast.await.unwrap();
        assert_eq!(names(&list.products()), ["fast"]);

        slow.await.unwrap();
        assert_eq!(catalog.requests(), ["slow", "fast"]);
        // The slow response arrived last but was issued first
        assert_eq!(names(&list.products()), ["fast"]);
    }

    #[test]
    fn test_add_to_cart_first_item() {
        let list = list(FakeCatalog::default(), Variant::Client);

        let outcome = list.add_to_cart(&Product::new("a", "Apple", Price::from(1_u64)));

        assert!(matches!(outcome, AddOutcome::Added(ref cart) if cart.len() == 1));
        assert_eq!(
            list.inner.cart.raw().as_deref(),
            Some(r#"[{"name":"a","title":"Apple","price":1}]"#)
        );
    }

    #[test]
    fn test_client_variant_dedupes() {
        let list = list(FakeCatalog::default(), Variant::Client);
        let apple = product("apple");

        assert!(list.can_add(&apple));
        list.add_to_cart(&apple);
        assert!(!list.can_add(&apple));
        assert_eq!(list.add_to_cart(&apple), AddOutcome::AlreadyInCart);
        assert_eq!(list.cart().len(), 1);
        assert!(list.can_add(&product("banana")));
    }

    #[test]
    fn test_public_variant_allows_duplicates() {
        let list = list(FakeCatalog::default(), Variant::Public);
        let apple = product("apple");

        list.add_to_cart(&apple);
        assert!(list.can_add(&apple));
        list.add_to_cart(&apple);

        assert_eq!(names(list.cart().items()), ["apple", "apple"]);
    }

    #[test]
    fn test_remove_from_cart() {
        let list = list(FakeCatalog::default(), Variant::Client);
        list.add_to_cart(&product("a"));
        list.add_to_cart(&product("b"));

        let cart = list.remove_from_cart(&ProductName::from("b")).unwrap();
        assert_eq!(names(cart.items()), ["a"]);
        assert!(list.can_add(&product("b")));
    }

    #[test]
    fn test_public_variant_cannot_remove() {
        let list = list(FakeCatalog::default(), Variant::Public);
        list.add_to_cart(&product("a"));

        assert_eq!(
            list.remove_from_cart(&ProductName::from("a")),
            Err(ListError::RemoveUnsupported)
        );
        assert_eq!(list.cart().len(), 1);
    }

    #[test]
    fn test_filter_from_url() {
        let url = Url::parse("http://x/products?page=2&filter=red%20apple").unwrap();
        assert_eq!(filter_from_url(&url).as_deref(), Some("red apple"));
        assert_eq!(filter_from_url(&Url::parse("http://x/products").unwrap()), None);
    }
}
