//! SQLite-backed store implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::traits::{StoreBackend, StoredEntry};
use crate::error::StoreError;
use crate::intercept::types::CachedResponse;

/// Durable store backend over a single SQLite database.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the store tables.
const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS stores (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Cached responses, serialized JSON per entry
CREATE TABLE IF NOT EXISTS entries (
    store_name TEXT NOT NULL,
    request_key TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (store_name, request_key),
    FOREIGN KEY (store_name) REFERENCES stores(name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_entries_store ON entries(store_name);
"#;

impl SqliteStore {
  /// Open or create the store database at the given path.
  pub fn open(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  fn run_migrations(&self) -> Result<(), StoreError> {
    let conn = self.lock_conn()?;
    conn.execute_batch(STORE_SCHEMA)?;
    Ok(())
  }

  fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
    self.conn.lock().map_err(|_| StoreError::LockPoisoned)
  }
}

impl StoreBackend for SqliteStore {
  fn open_store(&self, name: &str) -> Result<(), StoreError> {
    let conn = self.lock_conn()?;
    conn.execute(
      "INSERT OR IGNORE INTO stores (name) VALUES (?)",
      params![name],
    )?;
    Ok(())
  }

  fn get(&self, store: &str, key: &str) -> Result<Option<StoredEntry>, StoreError> {
    let conn = self.lock_conn()?;

    let mut stmt = conn.prepare(
      "SELECT data, cached_at FROM entries
       WHERE store_name = ? AND request_key = ?",
    )?;

    let row: Option<(Vec<u8>, String)> = stmt
      .query_row(params![store, key], |row| Ok((row.get(0)?, row.get(1)?)))
      .ok();

    match row {
      Some((data, cached_at_str)) => {
        let response: CachedResponse = serde_json::from_slice(&data)?;
        let cached_at = parse_datetime(&cached_at_str)?;
        Ok(Some(StoredEntry {
          response,
          cached_at,
        }))
      }
      None => Ok(None),
    }
  }

  fn put(&self, store: &str, key: &str, response: &CachedResponse) -> Result<(), StoreError> {
    let conn = self.lock_conn()?;
    let data = serde_json::to_vec(response)?;

    conn.execute(
      "INSERT OR IGNORE INTO stores (name) VALUES (?)",
      params![store],
    )?;
    conn.execute(
      "INSERT OR REPLACE INTO entries (store_name, request_key, data, cached_at)
       VALUES (?, ?, ?, datetime('now'))",
      params![store, key, data],
    )?;

    Ok(())
  }

  fn put_all(&self, store: &str, entries: &[(String, CachedResponse)]) -> Result<(), StoreError> {
    let conn = self.lock_conn()?;

    conn.execute("BEGIN TRANSACTION", [])?;

    let result = (|| -> Result<(), StoreError> {
      conn.execute(
        "INSERT OR IGNORE INTO stores (name) VALUES (?)",
        params![store],
      )?;

      for (key, response) in entries {
        let data = serde_json::to_vec(response)?;
        conn.execute(
          "INSERT OR REPLACE INTO entries (store_name, request_key, data, cached_at)
           VALUES (?, ?, ?, datetime('now'))",
          params![store, key, data],
        )?;
      }
      Ok(())
    })();

    match result {
      Ok(()) => {
        conn.execute("COMMIT", [])?;
        Ok(())
      }
      Err(e) => {
        let _ = conn.execute("ROLLBACK", []);
        Err(e)
      }
    }
  }

  fn delete_store(&self, name: &str) -> Result<bool, StoreError> {
    let conn = self.lock_conn()?;
    let deleted = conn.execute("DELETE FROM stores WHERE name = ?", params![name])?;
    Ok(deleted > 0)
  }

  fn store_names(&self) -> Result<Vec<String>, StoreError> {
    let conn = self.lock_conn()?;

    let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY name")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;

    Ok(names)
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|_| StoreError::Timestamp(s.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::intercept::types::ResponseKind;

  fn open_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("cache.db")).unwrap();
    (dir, store)
  }

  fn response(body: &str) -> CachedResponse {
    CachedResponse {
      status: 200,
      headers: vec![("content-type".to_string(), "text/html".to_string())],
      body: body.as_bytes().to_vec(),
      kind: ResponseKind::Basic,
    }
  }

  #[test]
  fn put_then_get_roundtrips() {
    let (_dir, store) = open_store();

    store.put("cerita-shell-v1", "key-1", &response("hello")).unwrap();

    let entry = store.get("cerita-shell-v1", "key-1").unwrap().unwrap();
    assert_eq!(entry.response, response("hello"));

    assert!(store.get("cerita-shell-v1", "other").unwrap().is_none());
    assert!(store.get("other-store", "key-1").unwrap().is_none());
  }

  #[test]
  fn put_replaces_existing_entry() {
    let (_dir, store) = open_store();

    store.put("s", "k", &response("old")).unwrap();
    store.put("s", "k", &response("new")).unwrap();

    let entry = store.get("s", "k").unwrap().unwrap();
    assert_eq!(entry.response.body, b"new".to_vec());
  }

  #[test]
  fn put_all_writes_every_entry() {
    let (_dir, store) = open_store();

    let entries = vec![
      ("a".to_string(), response("1")),
      ("b".to_string(), response("2")),
      ("c".to_string(), response("3")),
    ];
    store.put_all("shell", &entries).unwrap();

    for (key, expected) in &entries {
      let entry = store.get("shell", key).unwrap().unwrap();
      assert_eq!(&entry.response, expected);
    }
  }

  #[test]
  fn delete_store_removes_entries() {
    let (_dir, store) = open_store();

    store.put("stale", "k", &response("x")).unwrap();
    store.put("current", "k", &response("y")).unwrap();

    assert!(store.delete_store("stale").unwrap());
    assert!(!store.delete_store("stale").unwrap());

    assert!(store.get("stale", "k").unwrap().is_none());
    assert!(store.get("current", "k").unwrap().is_some());
    assert_eq!(store.store_names().unwrap(), vec!["current".to_string()]);
  }

  #[test]
  fn open_store_is_idempotent_and_listed() {
    let (_dir, store) = open_store();

    store.open_store("shell").unwrap();
    store.open_store("shell").unwrap();
    store.open_store("dynamic").unwrap();

    assert_eq!(
      store.store_names().unwrap(),
      vec!["dynamic".to_string(), "shell".to_string()]
    );
  }
}
