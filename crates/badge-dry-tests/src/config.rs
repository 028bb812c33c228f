// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use badge_app_core::config::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// In-memory [`ConfigStore`] that counts calls and can simulate failures.
///
/// Clones share state, so a test can hand one clone to a `SettingsService`
/// and inspect the other.
///
/// ```
/// use badge_app_core::settings::SettingsService;
/// use badge_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = SettingsService::new(store.clone());
/// let _ = service.load();
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `data`.
    pub fn with_data(data: BTreeMap<String, Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every subsequent load fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Make every subsequent save fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.lock().fail_on_save = fail;
    }

    /// Number of `read` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// Number of `write` attempts, failed ones included.
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Stored keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().data.keys().cloned().collect()
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    /// Raw bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().data.get(key).cloned()
    }

    /// Clear data, counters and failure flags.
    pub fn reset(&self) {
        *self.lock() = Inner::default();
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let mut inner = self.lock();
        inner.load_count += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Unavailable("simulated load failure".into()));
        }
        Ok(inner.data.get(key).cloned())
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.save_count += 1;
        if inner.fail_on_save {
            return Err(ConfigError::Unavailable("simulated save failure".into()));
        }
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn round_trip_save_load() {
        let store = InMemoryConfigStore::new();
        store.write("test", b"hello").unwrap();
        assert_eq!(store.read("test").unwrap().unwrap(), b"hello");
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn failures_still_count_and_store_nothing() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(matches!(
            store.write("key", b"value"),
            Err(ConfigError::Unavailable(_))
        ));
        assert_eq!(store.save_count(), 1);
        assert!(!store.contains_key("key"));

        store.set_fail_on_load(true);
        assert!(store.read("key").is_err());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = InMemoryConfigStore::new();
        assert!(store.read("absent").unwrap().is_none());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn keys_are_sorted() {
        let store = InMemoryConfigStore::new();
        store.write("gamma", b"c").unwrap();
        store.write("alpha", b"a").unwrap();
        store.write("beta", b"b").unwrap();
        assert_eq!(store.keys(), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn clones_share_state_and_reset() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.write("shared", b"v").unwrap();
        assert_eq!(b.raw("shared").unwrap(), b"v");
        a.set_fail_on_save(true);
        b.reset();
        assert!(a.keys().is_empty());
        a.write("again", b"ok").unwrap();
    }

    #[test]
    fn with_data_prepopulates_store() {
        let mut data = BTreeMap::new();
        data.insert("engine".to_owned(), b"{}".to_vec());
        let store = InMemoryConfigStore::with_data(data);
        assert_eq!(store.read("engine").unwrap().unwrap(), b"{}");
        assert_eq!(store.save_count(), 0);
    }
}
