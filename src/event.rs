use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;
use url::Url;

use crate::intercept::types::{CachedResponse, InterceptedRequest};

/// Worker events, one category per platform signal
#[derive(Debug)]
pub enum Event {
  /// New version activation signal
  Activate,
  /// Intercepted outbound request awaiting a response
  Fetch {
    request: InterceptedRequest,
    reply: oneshot::Sender<FetchOutcome>,
  },
  /// Inbound push payload (possibly absent)
  Push { payload: Option<Vec<u8>> },
  /// User interaction with a displayed notification
  NotificationAction {
    action: String,
    tag: String,
    data: serde_json::Value,
  },
  /// Reconnect signal carrying a record-class tag
  Sync { tag: String },
}

/// Outcome of one intercepted fetch, reported back over the bridge.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
  Handled(CachedResponse),
  Passthrough,
  Failed { error: String },
}

/// Wire form of inbound events, one JSON object per stdin line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
  Activate,
  Fetch {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default = "default_method")]
    method: String,
    url: Url,
    #[serde(default)]
    headers: Vec<(String, String)>,
  },
  Push {
    #[serde(default)]
    payload: Option<String>,
  },
  NotificationAction {
    action: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    data: serde_json::Value,
  },
  Sync {
    tag: String,
  },
}

fn default_method() -> String {
  "GET".to_string()
}

#[derive(Serialize)]
struct FetchReply {
  #[serde(skip_serializing_if = "Option::is_none")]
  id: Option<u64>,
  #[serde(flatten)]
  outcome: FetchOutcome,
}

/// Event handler that produces worker events from the stdin bridge
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Sender for injecting events directly (startup activation, tests)
  pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
    self.tx.clone()
  }

  /// Spawn the bridge task reading newline-delimited JSON events from
  /// stdin. Fetch events get their outcome written back to stdout as a
  /// JSON line carrying the request id.
  pub fn spawn_stdin_bridge(&self) {
    let tx = self.tx.clone();

    tokio::spawn(async move {
      let mut lines = BufReader::new(tokio::io::stdin()).lines();

      while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
          continue;
        }

        let wire: WireEvent = match serde_json::from_str(line) {
          Ok(wire) => wire,
          Err(e) => {
            warn!("ignoring malformed event line: {}", e);
            continue;
          }
        };

        if tx.send(convert(wire)).is_err() {
          break;
        }
      }
    });
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Convert a wire event, wiring fetch events to a stdout reply task.
fn convert(wire: WireEvent) -> Event {
  match wire {
    WireEvent::Activate => Event::Activate,
    WireEvent::Fetch {
      id,
      method,
      url,
      headers,
    } => {
      let (reply_tx, reply_rx) = oneshot::channel();

      tokio::spawn(async move {
        if let Ok(outcome) = reply_rx.await {
          match serde_json::to_string(&FetchReply { id, outcome }) {
            Ok(encoded) => println!("{}", encoded),
            Err(e) => warn!("failed to encode fetch reply: {}", e),
          }
        }
      });

      Event::Fetch {
        request: InterceptedRequest {
          method,
          url,
          headers,
        },
        reply: reply_tx,
      }
    }
    WireEvent::Push { payload } => Event::Push {
      payload: payload.map(String::into_bytes),
    },
    WireEvent::NotificationAction { action, tag, data } => {
      Event::NotificationAction { action, tag, data }
    }
    WireEvent::Sync { tag } => Event::Sync { tag },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fetch_wire_events_default_to_get() {
    let wire: WireEvent =
      serde_json::from_str(r#"{"type":"fetch","url":"https://cerita-app.web.app/"}"#).unwrap();

    match wire {
      WireEvent::Fetch {
        id,
        method,
        headers,
        ..
      } => {
        assert_eq!(id, None);
        assert_eq!(method, "GET");
        assert!(headers.is_empty());
      }
      other => panic!("unexpected event: {:?}", other),
    }
  }

  #[test]
  fn sync_wire_events_carry_the_tag() {
    let wire: WireEvent =
      serde_json::from_str(r#"{"type":"sync","tag":"sync-stories"}"#).unwrap();
    assert!(matches!(wire, WireEvent::Sync { tag } if tag == "sync-stories"));
  }

  #[test]
  fn push_payload_is_optional() {
    let wire: WireEvent = serde_json::from_str(r#"{"type":"push"}"#).unwrap();
    assert!(matches!(wire, WireEvent::Push { payload: None }));

    let wire: WireEvent =
      serde_json::from_str(r#"{"type":"push","payload":"{\"title\":\"T\"}"}"#).unwrap();
    assert!(matches!(wire, WireEvent::Push { payload: Some(_) }));
  }

  #[tokio::test]
  async fn injected_events_reach_the_receiver() {
    let mut events = EventHandler::new();
    events.sender().send(Event::Activate).unwrap();

    assert!(matches!(events.next().await, Some(Event::Activate)));
  }
}
