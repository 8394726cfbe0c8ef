//! Strategy layer that orchestrates cache lookups with network fetching.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::types::CachedResponse;
use crate::config::StoreNames;
use crate::error::FetchError;
use crate::store::StoreBackend;

/// Dual-strategy engine over the versioned cache stores.
///
/// This layer sits between the interception service and the network,
/// applying one of the two fixed strategies per request. Store writes on
/// both paths are fire-and-forget: the caller's response never waits on
/// them and their failure is logged, not surfaced.
pub struct InterceptEngine<S: StoreBackend> {
  store: Arc<S>,
  names: StoreNames,
}

impl<S: StoreBackend + 'static> InterceptEngine<S> {
  pub fn new(store: Arc<S>, names: StoreNames) -> Self {
    Self { store, names }
  }

  /// Network-first strategy for API-classified requests.
  ///
  /// 1. Attempt the network fetch
  /// 2. On success, duplicate the response into the dynamic store and return it
  /// 3. On failure, serve the prior dynamic entry for this key if present
  /// 4. Otherwise synthesize the structured offline response
  ///
  /// Never fails: API callers always receive a well-formed response.
  pub async fn network_first<F, Fut>(&self, key: &str, fetcher: F) -> CachedResponse
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedResponse, FetchError>>,
  {
    match fetcher().await {
      Ok(response) => {
        self.spawn_store_write(self.names.dynamic.clone(), key.to_string(), response.clone());
        response
      }
      Err(e) => {
        debug!("network-first fetch failed, falling back to cache: {}", e);
        match self.store.get(&self.names.dynamic, key) {
          Ok(Some(entry)) => {
            debug!("serving response cached at {}", entry.cached_at);
            entry.response
          }
          Ok(None) => CachedResponse::offline_fallback(),
          Err(e) => {
            warn!("dynamic store lookup failed: {}", e);
            CachedResponse::offline_fallback()
          }
        }
      }
    }
  }

  /// Cache-first strategy for static assets.
  ///
  /// 1. Look the key up across the current stores; a hit returns immediately
  ///    with no network attempt
  /// 2. On a miss, fetch; a fetch failure propagates unmodified
  /// 3. A fetched 200 same-origin response is duplicated into the shell
  ///    store; anything else is returned without caching
  pub async fn cache_first<F, Fut>(
    &self,
    key: &str,
    fetcher: F,
  ) -> Result<CachedResponse, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedResponse, FetchError>>,
  {
    for store in [&self.names.shell, &self.names.dynamic] {
      match self.store.get(store, key) {
        Ok(Some(entry)) => return Ok(entry.response),
        Ok(None) => {}
        Err(e) => warn!("cache lookup failed in {}: {}", store, e),
      }
    }

    let response = fetcher().await?;

    if response.is_cacheable_static() {
      self.spawn_store_write(self.names.shell.clone(), key.to_string(), response.clone());
    }

    Ok(response)
  }

  fn spawn_store_write(&self, store: String, key: String, response: CachedResponse) {
    let backend = Arc::clone(&self.store);
    tokio::spawn(async move {
      if let Err(e) = backend.put(&store, &key, &response) {
        warn!("failed to store response in {}: {}", store, e);
      }
    });
  }
}

impl<S: StoreBackend> Clone for InterceptEngine<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      names: self.names.clone(),
    }
  }
}
