//! Error taxonomy for the worker's core seams.

use thiserror::Error;

/// Cache store open/read/write failures.
///
/// Always best-effort on the interception write paths: a store failure there
/// is logged and swallowed, never surfaced to the original caller.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("cache database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("cache directory error: {0}")]
  Io(#[from] std::io::Error),

  #[error("cache store lock poisoned")]
  LockPoisoned,

  #[error("failed to encode cached response: {0}")]
  Encode(#[from] serde_json::Error),

  #[error("invalid cached_at timestamp '{0}'")]
  Timestamp(String),
}

/// Network fetch failures.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("{url} returned status {status}")]
  Status { url: String, status: u16 },
}

/// Local queue read/write failures.
#[derive(Debug, Error)]
pub enum QueueError {
  #[error("failed to open queue database: {0}")]
  Open(String),

  #[error("failed to read queue collection {collection}: {reason}")]
  Read { collection: String, reason: String },

  #[error("failed to write queue collection {collection}: {reason}")]
  Write { collection: String, reason: String },
}

/// Deferred-replay failures, propagated to the reconnect-signal mechanism.
///
/// The signal mechanism is expected to retry the whole replay later; no
/// partial progress is persisted when one of these occurs.
#[derive(Debug, Error)]
pub enum ReplayError {
  #[error(transparent)]
  Queue(#[from] QueueError),

  #[error("sync transport failed for record {id}: {reason}")]
  Transport { id: String, reason: String },
}

/// Failures reported by the platform surfaces (notifications, windows).
#[derive(Debug, Error)]
pub enum PlatformError {
  #[error("notification surface error: {0}")]
  Notification(String),

  #[error("window surface error: {0}")]
  Window(String),
}
