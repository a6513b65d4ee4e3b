//! Persistent key-value storage.
//!
//! # Architecture
//!
//! - [`Storage`] is the raw backend: string values under string keys
//! - [`StorageAdapter`] is the typed layer components use: JSON values in and
//!   out, failures logged rather than returned
//! - [`FileStorage`] persists to a directory and outlives the process
//! - [`MemoryStorage`] is the in-memory backend for tests
//!
//! One process-wide adapter is available through [`global`], installed from
//! the configuration by [`install_configured`]. Components never reach for it
//! themselves; the driver hands them a clone.
//!
//! # Example
//!
//! ```rust,ignore
//! use soft_shop_storefront::storage::{self, StorageAdapter};
//!
//! let storage = storage::global().clone();
//! storage.set("cart", &vec!["a", "b"]);
//! let cart: Option<Vec<String>> = storage.get("cart");
//! storage.remove("cart");
//! ```

mod file;
mod memory;

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::config::{DEFAULT_STORAGE_DIR, ShopConfig};

/// Well-known storage keys.
pub mod keys {
    /// The cart: a JSON array of cart items.
    pub const CART: &str = "cart";
    /// Session cookies of the storefront server.
    pub const SESSION: &str = "session";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("Serialization error for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A raw key-value backend.
///
/// Reads and writes are synchronous. Writers racing on the same key are
/// last-write-wins.
pub trait Storage: Send + Sync {
    /// The stored string, or `None` if the key is absent.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not persist the value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not delete the value.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed JSON access over a [`Storage`] backend.
///
/// Cheaply cloneable via `Arc`; clones share the backend.
#[derive(Clone)]
pub struct StorageAdapter {
    backend: Arc<dyn Storage>,
}

impl StorageAdapter {
    /// Wrap a backend.
    #[must_use]
    pub fn new(backend: impl Storage + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// An adapter over a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }

    /// An adapter over a [`FileStorage`] rooted at `dir`.
    #[must_use]
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStorage::new(dir))
    }

    /// Read and deserialize the value under `key`.
    ///
    /// Returns `None` if the key is absent or its value does not deserialize
    /// as `T`; the latter is logged.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(key, %error, "Ignoring unreadable stored value");
                None
            }
        }
    }

    /// Serialize `value` and store it under `key`.
    ///
    /// Never fails observably: errors are logged.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|source| StorageError::Serialize {
                key: key.to_string(),
                source,
            })
            .and_then(|raw| self.backend.set_item(key, &raw));

        if let Err(error) = result {
            warn!(key, %error, "Failed to store value");
        }
    }

    /// Delete any value under `key`. A no-op for absent keys.
    pub fn remove(&self, key: &str) {
        if let Err(error) = self.backend.remove_item(key) {
            warn!(key, %error, "Failed to remove value");
        }
    }

    /// The stored string under `key`, exactly as persisted.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.backend.get_item(key)
    }
}

static GLOBAL: OnceLock<StorageAdapter> = OnceLock::new();

/// The process-wide storage adapter.
///
/// Drivers set it up from their configuration with [`install_configured`]
/// before first use; otherwise it is built over a [`FileStorage`] in
/// `.soft-shop`.
pub fn global() -> &'static StorageAdapter {
    GLOBAL.get_or_init(|| StorageAdapter::file(DEFAULT_STORAGE_DIR))
}

/// Install the process-wide adapter.
///
/// # Errors
///
/// Returns the adapter back if the global was already initialized.
pub fn install_global(adapter: StorageAdapter) -> Result<(), StorageAdapter> {
    GLOBAL.set(adapter)
}

/// Install a [`FileStorage`] in the configured directory as the process-wide
/// adapter and return it. If the global was already set, it is returned
/// unchanged.
pub fn install_configured(config: &ShopConfig) -> &'static StorageAdapter {
    GLOBAL.get_or_init(|| StorageAdapter::file(&config.storage_dir))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Nested {
        label: String,
        tags: Vec<String>,
        weight: Option<f64>,
    }

    #[test]
    fn test_get_returns_what_set_stored() {
        let storage = StorageAdapter::in_memory();

        let values = [
            json!(null),
            json!(true),
            json!(42),
            json!(-1.5),
            json!("text"),
            json!([]),
            json!([{"name": "a", "title": "Apple", "price": 1}]),
            json!({"deep": {"list": [1, 2, {"x": null}]}}),
        ];
        for value in values {
            storage.set("k", &value);
            assert_eq!(storage.get::<serde_json::Value>("k"), Some(value));
        }

        let nested = Nested {
            label: "n".to_string(),
            tags: vec!["x".to_string(), "y".to_string()],
            weight: None,
        };
        storage.set("nested", &nested);
        assert_eq!(storage.get::<Nested>("nested"), Some(nested));
    }

    #[test]
    fn test_set_overwrites() {
        let storage = StorageAdapter::in_memory();
        storage.set("k", &1);
        storage.set("k", &2);
        assert_eq!(storage.get::<i32>("k"), Some(2));
    }

    #[test]
    fn test_absent_and_removed_keys() {
        let storage = StorageAdapter::in_memory();
        assert_eq!(storage.get::<i32>("missing"), None);

        storage.set("k", &"v");
        storage.remove("k");
        assert_eq!(storage.get::<String>("k"), None);

        // Removing again is a no-op
        storage.remove("k");
        assert_eq!(storage.get_raw("k"), None);
    }

    #[test]
    fn test_type_mismatch_reads_as_absent() {
        let storage = StorageAdapter::in_memory();
        storage.set("k", &"not a number");
        assert_eq!(storage.get::<u32>("k"), None);
        // The stored value itself is untouched
        assert_eq!(storage.get_raw("k").as_deref(), Some("\"not a number\""));
    }

    #[test]
    fn test_install_configured_uses_config_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let mut config = ShopConfig::new(url::Url::parse("http://shop.test/").unwrap());
        config.storage_dir = scratch.path().to_path_buf();

        let installed = install_configured(&config);
        installed.set(keys::CART, &json!([]));

        assert!(scratch.path().join("cart.json").exists());
        assert_eq!(global().get_raw(keys::CART).as_deref(), Some("[]"));
        // Installing again keeps the first adapter
        assert!(install_global(StorageAdapter::in_memory()).is_err());
    }

    #[test]
    fn test_clones_share_backend() {
        let storage = StorageAdapter::in_memory();
        let other = storage.clone();
        storage.set("k", &7);
        assert_eq!(other.get::<i32>("k"), Some(7));
    }

    fn arb_json() -> impl Strategy<Value = serde_json::Value> {
        // Quarter steps keep floats exactly representable in decimal text
        let leaf = prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            (-4_000_i32..4_000).prop_map(|n| serde_json::Value::from(f64::from(n) / 4.0)),
            "\\PC{0,12}".prop_map(serde_json::Value::from),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
                prop::collection::btree_map("[a-z]{0,6}", inner, 0..6)
                    .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_get_after_set_round_trips(key in "\\PC{1,16}", value in arb_json()) {
            let storage = StorageAdapter::in_memory();
            storage.set(&key, &value);
            prop_assert_eq!(storage.get::<serde_json::Value>(&key), Some(value));
        }
    }
}
