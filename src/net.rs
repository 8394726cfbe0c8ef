//! HTTP client wrapper that turns live fetches into cacheable responses.

use url::Url;

use crate::error::FetchError;
use crate::intercept::types::{CachedResponse, InterceptedRequest, ResponseKind};

/// Network client for the interception and lifecycle paths.
///
/// The response body is read to completion exactly once here; everything
/// downstream works with owned bytes and can be cloned freely.
#[derive(Clone)]
pub struct HttpClient {
  client: reqwest::Client,
  app_origin: Url,
}

impl HttpClient {
  pub fn new(app_origin: Url) -> Result<Self, FetchError> {
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, app_origin })
  }

  /// Perform the fetch for an intercepted GET request.
  pub async fn fetch(&self, request: &InterceptedRequest) -> Result<CachedResponse, FetchError> {
    let mut builder = self.client.get(request.url.clone());
    for (name, value) in &request.headers {
      builder = builder.header(name, value);
    }

    let response = builder.send().await?;

    let status = response.status().as_u16();
    let kind = if response.url().origin() == self.app_origin.origin() {
      ResponseKind::Basic
    } else {
      ResponseKind::Opaque
    };
    let headers: Vec<(String, String)> = response
      .headers()
      .iter()
      .filter_map(|(name, value)| {
        value
          .to_str()
          .ok()
          .map(|v| (name.to_string(), v.to_string()))
      })
      .collect();

    let body = response.bytes().await?.to_vec();

    Ok(CachedResponse {
      status,
      headers,
      body,
      kind,
    })
  }

  /// Fetch a shell resource for lifecycle population. Unlike interception
  /// fetches, a non-200 status is a failure here: a shell set with holes
  /// must not be stored.
  pub async fn fetch_shell(&self, url: Url) -> Result<CachedResponse, FetchError> {
    let response = self.fetch(&InterceptedRequest::get(url.clone())).await?;

    if response.status != 200 {
      return Err(FetchError::Status {
        url: url.to_string(),
        status: response.status,
      });
    }

    Ok(response)
  }
}
