//! Interception service that wires classification, strategies and the
//! network client together.

use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::classify::{classify, RequestClass};
use super::engine::InterceptEngine;
use super::types::{Intercepted, InterceptedRequest};
use crate::config::Config;
use crate::error::FetchError;
use crate::net::HttpClient;
use crate::store::StoreBackend;

/// Entry point for every outbound request.
///
/// Classifies the request once, then dispatches to the matching strategy.
pub struct InterceptService<S: StoreBackend> {
  engine: InterceptEngine<S>,
  client: HttpClient,
  api_origin: Url,
}

impl<S: StoreBackend + 'static> InterceptService<S> {
  pub fn new(store: Arc<S>, client: HttpClient, config: &Config) -> Self {
    Self {
      engine: InterceptEngine::new(store, config.store_names()),
      client,
      api_origin: config.api_origin.clone(),
    }
  }

  /// Handle one intercepted request.
  ///
  /// Non-GET requests bypass entirely. For GET requests the outcome is a
  /// response from one of the two strategies, or a propagated network
  /// failure for an unprimed static asset.
  pub async fn handle(&self, request: &InterceptedRequest) -> Result<Intercepted, FetchError> {
    if !request.is_get() {
      return Ok(Intercepted::Passthrough);
    }

    let key = request.cache_key();
    let class = classify(&request.url, &self.api_origin);
    debug!("intercepted {} as {:?}", request.url, class);

    let response = match class {
      RequestClass::Api => {
        self
          .engine
          .network_first(&key, || {
            let client = self.client.clone();
            let request = request.clone();
            async move { client.fetch(&request).await }
          })
          .await
      }
      RequestClass::Static => {
        self
          .engine
          .cache_first(&key, || {
            let client = self.client.clone();
            let request = request.clone();
            async move { client.fetch(&request).await }
          })
          .await?
      }
    };

    Ok(Intercepted::Handled(response))
  }
}
