//! Consumed platform surfaces: notification display and window control.
//!
//! The worker never talks to a real display or window manager directly; it
//! goes through these traits. The binary bridges them onto stdout as JSON
//! lines for the hosting application to act on.

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::error::PlatformError;

/// A notification ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub icon: String,
  pub badge: String,
  pub image: Option<String>,
  pub tag: String,
  pub data: serde_json::Value,
  pub require_interaction: bool,
  pub actions: Vec<NotificationAction>,
  pub vibrate: Vec<u32>,
  pub timestamp: i64,
}

/// One user-selectable action on a displayed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationAction {
  pub action: String,
  pub title: String,
  pub icon: Option<String>,
}

/// Notification display surface.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
  /// Display a notification; an equal tag replaces the previous one.
  async fn show(&self, notification: &Notification) -> Result<(), PlatformError>;

  /// Close a displayed notification by tag.
  async fn close(&self, tag: &str) -> Result<(), PlatformError>;
}

/// An open application window/view.
#[derive(Debug, Clone)]
pub struct WindowHandle {
  pub id: u64,
  pub url: Url,
}

/// Window enumeration, focus and open surface.
#[async_trait]
pub trait WindowSurface: Send + Sync {
  /// List currently open views.
  async fn list(&self) -> Result<Vec<WindowHandle>, PlatformError>;

  /// Focus an open view, optionally navigating it first.
  async fn focus(&self, id: u64, navigate_to: Option<&Url>) -> Result<(), PlatformError>;

  /// Open a new view at the given URL.
  async fn open(&self, url: &Url) -> Result<(), PlatformError>;

  /// Claim control of all active views immediately.
  async fn claim(&self) -> Result<(), PlatformError>;
}

/// Bridge that forwards surface calls to the hosting application as JSON
/// lines on stdout.
///
/// It cannot observe the host's windows, so `list` reports none and every
/// interaction resolves to opening a view.
pub struct StdioBridge;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum BridgeLine<'a> {
  ShowNotification { notification: &'a Notification },
  CloseNotification { tag: &'a str },
  FocusWindow { id: u64, url: Option<&'a str> },
  OpenWindow { url: &'a str },
  ClaimClients,
}

impl StdioBridge {
  pub fn new() -> Self {
    Self
  }

  fn emit(&self, line: &BridgeLine<'_>) -> Result<(), PlatformError> {
    let encoded = serde_json::to_string(line)
      .map_err(|e| PlatformError::Notification(format!("failed to encode bridge line: {}", e)))?;
    println!("{}", encoded);
    Ok(())
  }
}

#[async_trait]
impl NotificationSurface for StdioBridge {
  async fn show(&self, notification: &Notification) -> Result<(), PlatformError> {
    self.emit(&BridgeLine::ShowNotification { notification })
  }

  async fn close(&self, tag: &str) -> Result<(), PlatformError> {
    self.emit(&BridgeLine::CloseNotification { tag })
  }
}

#[async_trait]
impl WindowSurface for StdioBridge {
  async fn list(&self) -> Result<Vec<WindowHandle>, PlatformError> {
    Ok(Vec::new())
  }

  async fn focus(&self, id: u64, navigate_to: Option<&Url>) -> Result<(), PlatformError> {
    self.emit(&BridgeLine::FocusWindow {
      id,
      url: navigate_to.map(Url::as_str),
    })
  }

  async fn open(&self, url: &Url) -> Result<(), PlatformError> {
    self.emit(&BridgeLine::OpenWindow { url: url.as_str() })
  }

  async fn claim(&self) -> Result<(), PlatformError> {
    self.emit(&BridgeLine::ClaimClients)
  }
}
