//! Version activation: shell population, stale-store pruning, client claim.

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::config::StoreNames;
use crate::error::FetchError;
use crate::intercept::types::{CachedResponse, InterceptedRequest};
use crate::platform::WindowSurface;
use crate::store::StoreBackend;

/// Runs once per version activation.
pub struct Lifecycle<S, W> {
  store: Arc<S>,
  windows: Arc<W>,
  names: StoreNames,
  shell_urls: Vec<Url>,
}

impl<S: StoreBackend, W: WindowSurface> Lifecycle<S, W> {
  pub fn new(store: Arc<S>, windows: Arc<W>, names: StoreNames, shell_urls: Vec<Url>) -> Self {
    Self {
      store,
      windows,
      names,
      shell_urls,
    }
  }

  /// Activate the current version.
  ///
  /// Populates the shell store, prunes every store that does not belong to
  /// this version, then claims control of all active application instances.
  /// Population must complete before the claim; that ordering is the one
  /// cross-component guarantee the worker enforces.
  pub async fn activate<F, Fut>(&self, fetch: F) -> Result<()>
  where
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<CachedResponse, FetchError>>,
  {
    self.populate_shell(fetch).await?;
    self.prune_stale()?;

    self
      .windows
      .claim()
      .await
      .map_err(|e| eyre!("Failed to claim clients: {}", e))?;
    info!("version activated, stores {} / {}", self.names.shell, self.names.dynamic);

    Ok(())
  }

  /// Fetch the whole shell manifest, then store it in one transaction.
  ///
  /// Any single fetch failure (or non-200 status) fails the step before a
  /// single write happens; a partially populated shell is worse than none.
  async fn populate_shell<F, Fut>(&self, fetch: F) -> Result<()>
  where
    F: Fn(Url) -> Fut,
    Fut: Future<Output = Result<CachedResponse, FetchError>>,
  {
    self
      .store
      .open_store(&self.names.shell)
      .map_err(|e| eyre!("Failed to open shell store: {}", e))?;
    self
      .store
      .open_store(&self.names.dynamic)
      .map_err(|e| eyre!("Failed to open dynamic store: {}", e))?;

    let mut entries = Vec::with_capacity(self.shell_urls.len());
    for url in &self.shell_urls {
      let response = fetch(url.clone())
        .await
        .map_err(|e| eyre!("Failed to fetch shell resource {}: {}", url, e))?;

      if response.status != 200 {
        return Err(eyre!(
          "Shell resource {} returned status {}",
          url,
          response.status
        ));
      }

      let key = InterceptedRequest::get(url.clone()).cache_key();
      entries.push((key, response));
    }

    self
      .store
      .put_all(&self.names.shell, &entries)
      .map_err(|e| eyre!("Failed to store shell resources: {}", e))?;

    info!(
      "shell store {} populated with {} resources",
      self.names.shell,
      entries.len()
    );
    Ok(())
  }

  /// Delete every store left behind by prior versions.
  fn prune_stale(&self) -> Result<()> {
    let names = self
      .store
      .store_names()
      .map_err(|e| eyre!("Failed to enumerate stores: {}", e))?;

    for name in names {
      if !self.names.is_current(&name) {
        self
          .store
          .delete_store(&name)
          .map_err(|e| eyre!("Failed to delete stale store {}: {}", name, e))?;
        info!("deleted stale cache store {}", name);
      }
    }

    Ok(())
  }
}
