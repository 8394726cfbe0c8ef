//! Deferred replay of locally queued writes on reconnect.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{FAVORITES_COLLECTION, SYNC_STORIES_TAG};
use crate::error::ReplayError;
use crate::queue::{QueuedRecord, RecordQueue};

/// Remote side of record synchronization.
///
/// This is the extension point for actually pushing queued records to the
/// story API; the replay flow only advances local flags for records the
/// transport has accepted.
#[async_trait]
pub trait SyncTransport: Send + Sync {
  async fn push(&self, record: &QueuedRecord) -> Result<(), ReplayError>;
}

/// Transport that accepts every record without a remote call.
pub struct NoopTransport;

#[async_trait]
impl SyncTransport for NoopTransport {
  async fn push(&self, _record: &QueuedRecord) -> Result<(), ReplayError> {
    Ok(())
  }
}

/// Replays unsynced queue records when connectivity returns.
pub struct ReplayCoordinator<Q, T> {
  queue: Arc<Q>,
  transport: Arc<T>,
}

impl<Q: RecordQueue, T: SyncTransport> ReplayCoordinator<Q, T> {
  pub fn new(queue: Arc<Q>, transport: Arc<T>) -> Self {
    Self { queue, transport }
  }

  /// Handle one reconnect signal.
  ///
  /// Only the `sync-stories` tag is recognized; other tags are ignored.
  /// Every unsynced record is pushed through the transport, then all flag
  /// updates land as one batched write. Any failure fails the whole attempt
  /// with nothing persisted; the signal mechanism retries later.
  pub async fn on_sync(&self, tag: &str) -> Result<(), ReplayError> {
    if tag != SYNC_STORIES_TAG {
      debug!("ignoring sync signal with tag {}", tag);
      return Ok(());
    }

    let records = self.queue.read_all(FAVORITES_COLLECTION)?;
    let unsynced: Vec<QueuedRecord> = records.into_iter().filter(|r| !r.synced).collect();

    if unsynced.is_empty() {
      debug!("no unsynced records, nothing to replay");
      return Ok(());
    }

    let mut updated = Vec::with_capacity(unsynced.len());
    for record in unsynced {
      self.transport.push(&record).await?;
      updated.push(QueuedRecord {
        synced: true,
        ..record
      });
    }

    self.queue.write_batch(FAVORITES_COLLECTION, &updated)?;
    info!("replayed {} queued records", updated.len());

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::QueueError;
  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  #[derive(Default)]
  struct MemoryQueue {
    collections: Mutex<HashMap<String, Vec<QueuedRecord>>>,
    writes: AtomicUsize,
  }

  impl MemoryQueue {
    fn seed(&self, collection: &str, records: Vec<QueuedRecord>) {
      self
        .collections
        .lock()
        .unwrap()
        .insert(collection.to_string(), records);
    }
  }

  impl RecordQueue for MemoryQueue {
    fn read_all(&self, collection: &str) -> Result<Vec<QueuedRecord>, QueueError> {
      Ok(
        self
          .collections
          .lock()
          .unwrap()
          .get(collection)
          .cloned()
          .unwrap_or_default(),
      )
    }

    fn write_batch(&self, collection: &str, records: &[QueuedRecord]) -> Result<(), QueueError> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      let mut collections = self.collections.lock().unwrap();
      let stored = collections.entry(collection.to_string()).or_default();
      for record in records {
        match stored.iter_mut().find(|r| r.id == record.id) {
          Some(existing) => *existing = record.clone(),
          None => stored.push(record.clone()),
        }
      }
      Ok(())
    }
  }

  struct FailingTransport;

  #[async_trait]
  impl SyncTransport for FailingTransport {
    async fn push(&self, record: &QueuedRecord) -> Result<(), ReplayError> {
      Err(ReplayError::Transport {
        id: record.id.clone(),
        reason: "remote unreachable".to_string(),
      })
    }
  }

  fn record(id: &str, synced: bool) -> QueuedRecord {
    QueuedRecord {
      id: id.to_string(),
      data: serde_json::json!({"story": id}),
      synced,
    }
  }

  fn coordinator(queue: Arc<MemoryQueue>) -> ReplayCoordinator<MemoryQueue, NoopTransport> {
    ReplayCoordinator::new(queue, Arc::new(NoopTransport))
  }

  #[tokio::test]
  async fn unrecognized_tags_are_ignored() {
    let queue = Arc::new(MemoryQueue::default());
    queue.seed(FAVORITES_COLLECTION, vec![record("a", false)]);

    coordinator(Arc::clone(&queue))
      .on_sync("sync-comments")
      .await
      .unwrap();

    assert_eq!(queue.writes.load(Ordering::SeqCst), 0);
    assert!(!queue.read_all(FAVORITES_COLLECTION).unwrap()[0].synced);
  }

  #[tokio::test]
  async fn zero_unsynced_records_issue_no_write() {
    let queue = Arc::new(MemoryQueue::default());
    queue.seed(
      FAVORITES_COLLECTION,
      vec![record("a", true), record("b", true)],
    );

    coordinator(Arc::clone(&queue))
      .on_sync(SYNC_STORIES_TAG)
      .await
      .unwrap();

    assert_eq!(queue.writes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn replay_marks_exactly_the_unsynced_records() {
    let queue = Arc::new(MemoryQueue::default());
    queue.seed(
      FAVORITES_COLLECTION,
      vec![record("a", false), record("b", true), record("c", false)],
    );

    coordinator(Arc::clone(&queue))
      .on_sync(SYNC_STORIES_TAG)
      .await
      .unwrap();

    let records = queue.read_all(FAVORITES_COLLECTION).unwrap();
    assert!(records.iter().all(|r| r.synced));
    assert_eq!(records.len(), 3);
    // One batched write, not one per record
    assert_eq!(queue.writes.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn transport_failure_persists_nothing() {
    let queue = Arc::new(MemoryQueue::default());
    queue.seed(FAVORITES_COLLECTION, vec![record("a", false)]);

    let coordinator = ReplayCoordinator::new(Arc::clone(&queue), Arc::new(FailingTransport));
    let result = coordinator.on_sync(SYNC_STORIES_TAG).await;

    assert!(matches!(result, Err(ReplayError::Transport { .. })));
    assert_eq!(queue.writes.load(Ordering::SeqCst), 0);
    assert!(!queue.read_all(FAVORITES_COLLECTION).unwrap()[0].synced);
  }
}
