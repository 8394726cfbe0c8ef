//! Request and response types shared across the interception engine.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Offline fallback body text for API-classified requests.
pub const OFFLINE_MESSAGE: &str = "Offline - Data tidak tersedia";

/// An outbound request seen by the interception layer.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
  pub method: String,
  pub url: Url,
  pub headers: Vec<(String, String)>,
}

impl InterceptedRequest {
  /// A plain GET request with no extra headers.
  pub fn get(url: Url) -> Self {
    Self {
      method: "GET".to_string(),
      url,
      headers: Vec::new(),
    }
  }

  /// Only GET requests are intercepted; everything else passes through.
  pub fn is_get(&self) -> bool {
    self.method.eq_ignore_ascii_case("GET")
  }

  /// Stable cache key for this request: method, URL and the
  /// content-negotiation headers, hashed to a fixed-length hex string.
  pub fn cache_key(&self) -> String {
    let mut input = format!("{} {}", self.method.to_uppercase(), self.url);
    for (name, value) in &self.headers {
      if name.eq_ignore_ascii_case("accept") || name.eq_ignore_ascii_case("accept-language") {
        input.push('\n');
        input.push_str(&name.to_lowercase());
        input.push(':');
        input.push_str(value.trim());
      }
    }

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// How a response body relates to the application origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
  /// Same-origin response with readable status, headers and body
  Basic,
  /// Cross-origin response, treated as opaque
  Opaque,
}

/// A response as held in the cache stores and returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: Vec<u8>,
  pub kind: ResponseKind,
}

impl CachedResponse {
  /// Structured response served when an API request fails with no prior
  /// cached entry. API callers always receive a well-formed response, never
  /// a bare network error.
  pub fn offline_fallback() -> Self {
    let body = serde_json::json!({
      "error": true,
      "message": OFFLINE_MESSAGE,
    });

    Self {
      status: 503,
      headers: vec![("content-type".to_string(), "application/json".to_string())],
      body: serde_json::to_vec(&body).expect("offline body serializes"),
      kind: ResponseKind::Basic,
    }
  }

  /// Whether the static path may persist this response: status 200 and
  /// same-origin only. Opaque and error responses are never stored.
  pub fn is_cacheable_static(&self) -> bool {
    self.status == 200 && self.kind == ResponseKind::Basic
  }
}

/// Outcome of running a request through the interception layer.
#[derive(Debug)]
pub enum Intercepted {
  /// A response produced by one of the two strategies
  Handled(CachedResponse),
  /// Non-GET request; no interception contract applies
  Passthrough,
}
