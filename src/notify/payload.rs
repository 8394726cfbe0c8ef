//! Push payload decoding.

use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Default notification title when the payload carries none.
pub const DEFAULT_TITLE: &str = "Cerita Baru";

/// Default notification body when the payload carries none.
pub const DEFAULT_BODY: &str = "Ada cerita baru untuk Anda!";

const DEFAULT_ICON: &str = "/icons/icon-192x192.png";
const DEFAULT_BADGE: &str = "/icons/icon-192x192.png";
const DEFAULT_TAG: &str = "cerita";

/// Structured form of an inbound push payload.
///
/// Every field has a default so a malformed or absent payload still yields
/// a displayable notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationPayload {
  pub title: String,
  #[serde(alias = "message")]
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub image: Option<String>,
  pub tag: String,
  pub data: serde_json::Value,
  pub require_interaction: bool,
}

impl Default for NotificationPayload {
  fn default() -> Self {
    Self {
      title: DEFAULT_TITLE.to_string(),
      body: DEFAULT_BODY.to_string(),
      icon: DEFAULT_ICON.to_string(),
      badge: DEFAULT_BADGE.to_string(),
      image: None,
      tag: DEFAULT_TAG.to_string(),
      data: serde_json::Value::Null,
      require_interaction: false,
    }
  }
}

impl NotificationPayload {
  /// Target URL carried in the associated data, if any, resolved against
  /// the application root.
  pub fn target_url(&self, app_root: &Url) -> Option<Url> {
    self
      .data
      .get("url")
      .and_then(|v| v.as_str())
      .and_then(|s| app_root.join(s).ok())
  }
}

/// Decode an inbound push payload.
///
/// No payload yields the static defaults; a payload that is not valid JSON
/// is treated as a flat text body. Decoding never fails.
pub fn decode(payload: Option<&[u8]>) -> NotificationPayload {
  let raw = match payload {
    Some(raw) if !raw.is_empty() => raw,
    _ => return NotificationPayload::default(),
  };

  match serde_json::from_slice(raw) {
    Ok(decoded) => decoded,
    Err(e) => {
      debug!("push payload is not JSON, using it as plain text: {}", e);
      NotificationPayload {
        body: String::from_utf8_lossy(raw).into_owned(),
        ..NotificationPayload::default()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn structured_payload_overrides_defaults() {
    let decoded = decode(Some(br#"{"title":"T","body":"B"}"#));
    assert_eq!(decoded.title, "T");
    assert_eq!(decoded.body, "B");
    assert_eq!(decoded.icon, DEFAULT_ICON);
    assert_eq!(decoded.badge, DEFAULT_BADGE);
  }

  #[test]
  fn message_is_an_alias_for_body() {
    let decoded = decode(Some(br#"{"message":"from alias"}"#));
    assert_eq!(decoded.body, "from alias");
  }

  #[test]
  fn absent_payload_yields_defaults() {
    assert_eq!(decode(None), NotificationPayload::default());
    assert_eq!(decode(Some(b"")), NotificationPayload::default());

    let defaults = decode(None);
    assert_eq!(defaults.title, "Cerita Baru");
    assert_eq!(defaults.body, "Ada cerita baru untuk Anda!");
  }

  #[test]
  fn non_json_payload_becomes_the_body_text() {
    let decoded = decode(Some(b"server restarting soon"));
    assert_eq!(decoded.title, DEFAULT_TITLE);
    assert_eq!(decoded.body, "server restarting soon");
  }

  #[test]
  fn camel_case_fields_are_accepted() {
    let decoded = decode(Some(br#"{"requireInteraction":true,"tag":"story-9"}"#));
    assert!(decoded.require_interaction);
    assert_eq!(decoded.tag, "story-9");
  }

  #[test]
  fn target_url_resolves_against_app_root() {
    let root = Url::parse("https://cerita-app.web.app/").unwrap();

    let with_path = decode(Some(br#"{"data":{"url":"/stories/42"}}"#));
    assert_eq!(
      with_path.target_url(&root).unwrap().as_str(),
      "https://cerita-app.web.app/stories/42"
    );

    let without_url = decode(Some(br#"{"data":{"storyId":42}}"#));
    assert!(without_url.target_url(&root).is_none());
  }
}
