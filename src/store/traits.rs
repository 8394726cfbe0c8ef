//! Storage trait for named, durable response stores.

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::intercept::types::CachedResponse;

/// A single stored response entry.
#[derive(Debug, Clone)]
pub struct StoredEntry {
  /// The cached response
  pub response: CachedResponse,
  /// When the entry was written
  pub cached_at: DateTime<Utc>,
}

/// Backend for named key→response stores.
///
/// Stores are identified by name; entries by request key. Writing an existing
/// key replaces the entry, which is the only way an entry ever changes.
pub trait StoreBackend: Send + Sync {
  /// Open a store by name, creating it if absent.
  fn open_store(&self, name: &str) -> Result<(), StoreError>;

  /// Look up an entry by store name and request key.
  fn get(&self, store: &str, key: &str) -> Result<Option<StoredEntry>, StoreError>;

  /// Write a single entry, creating the store if absent.
  fn put(&self, store: &str, key: &str, response: &CachedResponse) -> Result<(), StoreError>;

  /// Write a batch of entries in one transaction: either every entry lands
  /// or none does.
  fn put_all(&self, store: &str, entries: &[(String, CachedResponse)]) -> Result<(), StoreError>;

  /// Delete a store and its entries. Returns whether the store existed.
  fn delete_store(&self, name: &str) -> Result<bool, StoreError>;

  /// Enumerate all store names currently present.
  fn store_names(&self) -> Result<Vec<String>, StoreError>;
}
