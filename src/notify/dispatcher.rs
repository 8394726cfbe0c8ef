//! Notification display and interaction routing.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::payload::{decode, NotificationPayload};
use crate::error::PlatformError;
use crate::platform::{Notification, NotificationAction, NotificationSurface, WindowSurface};

/// Action id for the "View" button and the default click.
pub const ACTION_VIEW: &str = "view";

/// Action id for the "Close" button.
pub const ACTION_CLOSE: &str = "close";

/// Dispatches inbound pushes to the notification surface and routes user
/// interaction back into the window layer.
pub struct NotificationDispatcher<N, W> {
  surface: Arc<N>,
  windows: Arc<W>,
  app_origin: Url,
}

impl<N: NotificationSurface, W: WindowSurface> NotificationDispatcher<N, W> {
  pub fn new(surface: Arc<N>, windows: Arc<W>, app_origin: Url) -> Self {
    Self {
      surface,
      windows,
      app_origin,
    }
  }

  /// Handle one inbound push payload: decode and display.
  pub async fn on_push(&self, payload: Option<&[u8]>) -> Result<(), PlatformError> {
    let decoded = decode(payload);
    let notification = self.build(decoded);
    self.surface.show(&notification).await
  }

  /// Handle a user interaction with a displayed notification.
  ///
  /// "Close" only dismisses. "View" (and the default click) dismisses, then
  /// brings at most one window to the target: an existing same-origin window
  /// is focused (and navigated if the payload named a URL), otherwise one
  /// new window opens.
  pub async fn on_action(
    &self,
    action: &str,
    tag: &str,
    data: &serde_json::Value,
  ) -> Result<(), PlatformError> {
    self.surface.close(tag).await?;

    if action == ACTION_CLOSE {
      return Ok(());
    }

    let payload = NotificationPayload {
      data: data.clone(),
      ..NotificationPayload::default()
    };
    let target = payload.target_url(&self.app_origin);

    for window in self.windows.list().await? {
      if window.url.origin() == self.app_origin.origin() {
        debug!("focusing existing window {}", window.id);
        return self.windows.focus(window.id, target.as_ref()).await;
      }
    }

    let open_at = target.unwrap_or_else(|| self.app_origin.clone());
    self.windows.open(&open_at).await
  }

  fn build(&self, payload: NotificationPayload) -> Notification {
    Notification {
      title: payload.title,
      body: payload.body,
      icon: payload.icon,
      badge: payload.badge,
      image: payload.image,
      tag: payload.tag,
      data: payload.data,
      require_interaction: payload.require_interaction,
      actions: vec![
        NotificationAction {
          action: ACTION_VIEW.to_string(),
          title: "View".to_string(),
          icon: None,
        },
        NotificationAction {
          action: ACTION_CLOSE.to_string(),
          title: "Close".to_string(),
          icon: None,
        },
      ],
      vibrate: vec![100, 50, 100],
      timestamp: Utc::now().timestamp_millis(),
    }
  }
}
