//! Request classification by origin.

use url::Url;

/// Class of an intercepted request, derived once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestClass {
  /// Request to the story API origin; served network-first
  Api,
  /// Anything else; served cache-first
  Static,
}

/// Classify a request by origin alone.
pub fn classify(url: &Url, api_origin: &Url) -> RequestClass {
  if url.origin() == api_origin.origin() {
    RequestClass::Api
  } else {
    RequestClass::Static
  }
}
