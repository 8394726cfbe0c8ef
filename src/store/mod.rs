//! Versioned cache stores: named, durable key→response stores.
//!
//! This module provides the storage layer shared by the lifecycle manager
//! and the interception engine:
//! - Stores are opened-or-created by name and enumerable for pruning
//! - Entries are keyed by full request identity and replaced on overwrite
//! - Batch writes land atomically (all or nothing)

#[cfg(test)]
mod memory;
mod sqlite;
mod traits;

#[cfg(test)]
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StoreBackend, StoredEntry};
