//! In-memory store backend for tests.

use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::traits::{StoreBackend, StoredEntry};
use crate::error::StoreError;
use crate::intercept::types::CachedResponse;

/// Store backend backed by a `Mutex<BTreeMap>`.
#[derive(Default)]
pub struct MemoryStore {
  stores: Mutex<BTreeMap<String, HashMap<String, StoredEntry>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl StoreBackend for MemoryStore {
  fn open_store(&self, name: &str) -> Result<(), StoreError> {
    let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    stores.entry(name.to_string()).or_default();
    Ok(())
  }

  fn get(&self, store: &str, key: &str) -> Result<Option<StoredEntry>, StoreError> {
    let stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    Ok(stores.get(store).and_then(|s| s.get(key)).cloned())
  }

  fn put(&self, store: &str, key: &str, response: &CachedResponse) -> Result<(), StoreError> {
    let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    stores.entry(store.to_string()).or_default().insert(
      key.to_string(),
      StoredEntry {
        response: response.clone(),
        cached_at: Utc::now(),
      },
    );
    Ok(())
  }

  fn put_all(&self, store: &str, entries: &[(String, CachedResponse)]) -> Result<(), StoreError> {
    let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    let target = stores.entry(store.to_string()).or_default();
    for (key, response) in entries {
      target.insert(
        key.clone(),
        StoredEntry {
          response: response.clone(),
          cached_at: Utc::now(),
        },
      );
    }
    Ok(())
  }

  fn delete_store(&self, name: &str) -> Result<bool, StoreError> {
    let mut stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    Ok(stores.remove(name).is_some())
  }

  fn store_names(&self) -> Result<Vec<String>, StoreError> {
    let stores = self.stores.lock().map_err(|_| StoreError::LockPoisoned)?;
    Ok(stores.keys().cloned().collect())
  }
}
