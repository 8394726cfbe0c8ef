//! Local queue of records the application wrote while offline.
//!
//! The queue's storage engine belongs to the hosting application; the sync
//! logic only sees it as named collections of records carrying a `synced`
//! flag. A SQLite implementation is provided for the standalone worker.

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::QueueError;

/// One locally queued record.
///
/// Created unsynced by the application while offline; the replay coordinator
/// advances the flag. Records are never deleted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRecord {
  pub id: String,
  pub data: serde_json::Value,
  #[serde(default)]
  pub synced: bool,
}

/// Key-value-with-flag store over named record collections.
pub trait RecordQueue: Send + Sync {
  /// Read all records of a collection.
  fn read_all(&self, collection: &str) -> Result<Vec<QueuedRecord>, QueueError>;

  /// Write updated records as a single batch: either all land or none do.
  fn write_batch(&self, collection: &str, records: &[QueuedRecord]) -> Result<(), QueueError>;
}

/// SQLite-backed record queue.
pub struct SqliteQueue {
  conn: Mutex<Connection>,
}

const QUEUE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS queue_records (
    collection TEXT NOT NULL,
    record_id TEXT NOT NULL,
    data BLOB NOT NULL,
    synced INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (collection, record_id)
);
"#;

impl SqliteQueue {
  /// Open or create the queue database at the given path.
  pub fn open(path: &Path) -> Result<Self, QueueError> {
    let conn = Connection::open(path).map_err(|e| QueueError::Open(e.to_string()))?;
    conn
      .execute_batch(QUEUE_SCHEMA)
      .map_err(|e| QueueError::Open(e.to_string()))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock_conn(&self, collection: &str) -> Result<MutexGuard<'_, Connection>, QueueError> {
    self.conn.lock().map_err(|_| QueueError::Read {
      collection: collection.to_string(),
      reason: "queue lock poisoned".to_string(),
    })
  }
}

impl RecordQueue for SqliteQueue {
  fn read_all(&self, collection: &str) -> Result<Vec<QueuedRecord>, QueueError> {
    let read_err = |reason: String| QueueError::Read {
      collection: collection.to_string(),
      reason,
    };

    let conn = self.lock_conn(collection)?;

    let mut stmt = conn
      .prepare(
        "SELECT record_id, data, synced FROM queue_records
         WHERE collection = ? ORDER BY record_id",
      )
      .map_err(|e| read_err(e.to_string()))?;

    let rows = stmt
      .query_map(params![collection], |row| {
        let id: String = row.get(0)?;
        let data: Vec<u8> = row.get(1)?;
        let synced: bool = row.get(2)?;
        Ok((id, data, synced))
      })
      .map_err(|e| read_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
      let (id, data, synced) = row.map_err(|e| read_err(e.to_string()))?;
      let data = serde_json::from_slice(&data).map_err(|e| read_err(e.to_string()))?;
      records.push(QueuedRecord { id, data, synced });
    }

    Ok(records)
  }

  fn write_batch(&self, collection: &str, records: &[QueuedRecord]) -> Result<(), QueueError> {
    let write_err = |reason: String| QueueError::Write {
      collection: collection.to_string(),
      reason,
    };

    let conn = self.lock_conn(collection)?;

    conn
      .execute("BEGIN TRANSACTION", [])
      .map_err(|e| write_err(e.to_string()))?;

    let result = (|| -> Result<(), QueueError> {
      for record in records {
        let data = serde_json::to_vec(&record.data).map_err(|e| write_err(e.to_string()))?;
        conn
          .execute(
            "INSERT OR REPLACE INTO queue_records (collection, record_id, data, synced)
             VALUES (?, ?, ?, ?)",
            params![collection, record.id, data, record.synced],
          )
          .map_err(|e| write_err(e.to_string()))?;
      }
      Ok(())
    })();

    match result {
      Ok(()) => {
        conn
          .execute("COMMIT", [])
          .map_err(|e| write_err(e.to_string()))?;
        Ok(())
      }
      Err(e) => {
        let _ = conn.execute("ROLLBACK", []);
        Err(e)
      }
    }
  }
}
