//! Cart persistence.
//!
//! Every read of the cart goes through [`CartStore::load`], which treats an
//! absent (or unreadable) `"cart"` key as an empty cart. Mutations are
//! read-modify-write against storage, never against a cached copy, so an edit
//! made by another process since the last read is not lost to a stale
//! in-memory cart (concurrent writers remain last-write-wins).

use soft_shop_core::{Cart, CartItem, ProductName};
use tracing::info;

use crate::error::add_breadcrumb;
use crate::storage::{StorageAdapter, keys};

/// Reads and writes the cart under the `"cart"` storage key.
#[derive(Clone)]
pub struct CartStore {
    storage: StorageAdapter,
}

impl CartStore {
    #[must_use]
    pub const fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }

    /// The current cart. Absent means empty.
    #[must_use]
    pub fn load(&self) -> Cart {
        self.storage.get::<Cart>(keys::CART).unwrap_or_default()
    }

    /// Replace the stored cart.
    pub fn save(&self, cart: &Cart) {
        self.storage.set(keys::CART, cart);
    }

    /// Append `item` to the stored cart and return the new cart.
    pub fn append(&self, item: CartItem) -> Cart {
        let mut cart = self.load();
        info!(product = %item.name, "Adding to cart");
        add_breadcrumb("cart", "Added to cart", Some(&[("product", item.name.as_str())]));
        cart.push(item);
        self.save(&cart);
        cart
    }

    /// Drop every item named `name` from the stored cart and return the new
    /// cart. The cart is written back even when nothing matched.
    pub fn remove_named(&self, name: &ProductName) -> Cart {
        let mut cart = self.load();
        let removed = cart.remove_named(name);
        info!(product = %name, removed, "Removing from cart");
        add_breadcrumb("cart", "Removed from cart", Some(&[("product", name.as_str())]));
        self.save(&cart);
        cart
    }

    /// Delete the stored cart.
    pub fn clear(&self) {
        self.storage.remove(keys::CART);
    }

    /// The stored cart exactly as persisted, if any.
    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.storage.get_raw(keys::CART)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use soft_shop_core::{Price, Product};

    fn store() -> CartStore {
        CartStore::new(StorageAdapter::in_memory())
    }

    fn product(name: &str, title: &str, price: u64) -> Product {
        Product::new(name, title, Price::from(price))
    }

    #[test]
    fn test_absent_cart_is_empty() {
        let store = store();
        assert!(store.raw().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_first_add_persists_exact_json() {
        let store = store();
        store.append(product("a", "Apple", 1));
        assert_eq!(
            store.raw().as_deref(),
            Some(r#"[{"name":"a","title":"Apple","price":1}]"#)
        );
    }

    #[test]
    fn test_appends_accumulate_in_order() {
        let store = store();
        let added = [
            product("a", "Apple", 1),
            product("b", "Banana", 2),
            product("a", "Apple", 1),
            product("c", "Cherry", 3),
        ];
        for item in &added {
            store.append(item.clone());
        }
        assert_eq!(store.load(), Cart::from(added.to_vec()));
    }

    #[test]
    fn test_append_rereads_storage() {
        let storage = StorageAdapter::in_memory();
        let first = CartStore::new(storage.clone());
        let second = CartStore::new(storage);

        first.append(product("a", "Apple", 1));
        // A second handle (another "tab") sees the first write before appending
        second.append(product("b", "Banana", 2));

        let names: Vec<String> = first.load().iter().map(|i| i.name.to_string()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_remove_named() {
        let store = store();
        store.append(product("a", "Apple", 1));
        store.append(product("b", "Banana", 2));

        let cart = store.remove_named(&ProductName::from("b"));
        assert_eq!(cart, Cart::from(vec![product("a", "Apple", 1)]));
        assert_eq!(store.load(), cart);

        // Idempotent
        assert_eq!(store.remove_named(&ProductName::from("b")), cart);
    }

    #[test]
    fn test_clear() {
        let store = store();
        store.append(product("a", "Apple", 1));
        store.clear();
        assert!(store.raw().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_garbage_reads_as_empty() {
        let storage = StorageAdapter::in_memory();
        storage.set(keys::CART, &serde_json::json!({"not": "an array"}));
        assert!(CartStore::new(storage).load().is_empty());
    }

    #[derive(Debug, Clone)]
    enum CartOp {
        Add(Product),
        Remove(String),
    }

    fn arb_op() -> impl Strategy<Value = CartOp> {
        // A small name pool so removes hit and duplicates occur
        let name = prop::sample::select(vec!["a", "b", "c", "d"]);
        prop_oneof![
            3 => (name.clone(), 0_u64..1_000)
                .prop_map(|(name, price)| CartOp::Add(product(name, &name.to_uppercase(), price))),
            1 => name.prop_map(|name| CartOp::Remove(name.to_string())),
        ]
    }

    proptest! {
        #[test]
        fn test_cart_matches_list_model(ops in prop::collection::vec(arb_op(), 0..40)) {
            let store = store();
            let mut model: Vec<Product> = Vec::new();

            for op in ops {
                let cart = match op {
                    CartOp::Add(item) => {
                        model.push(item.clone());
                        store.append(item)
                    }
                    CartOp::Remove(name) => {
                        model.retain(|item| item.name != name.as_str());
                        store.remove_named(&ProductName::from(name))
                    }
                };
                prop_assert_eq!(&cart, &Cart::from(model.clone()));
                prop_assert_eq!(store.load(), cart);
            }
        }
    }
}
