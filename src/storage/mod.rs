// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistence for the bookkeeping domain, split into two stores:
//!
//! - the **record store**: every entity as one JSON row in an ACID table,
//!   keyed by a composite key that embeds the owning account
//! - the **blob store**: binary image payloads addressed by
//!   `users/{account_id}/images/{image_id}`
//!
//! ## Storage Layout
//!
//! ```text
//! $DATA_DIR/
//!   moneybook.redb      # record store (tables below)
//!   blobs/              # blob store root (when offloading is enabled)
//!     users/{account_id}/images/{image_id}
//! ```
//!
//! | Table | Key |
//! |-------|-----|
//! | `accounts` | `account_id` |
//! | `sessions` | `account_id\|token` |
//! | `wallets` | `account_id\|wallet_id` |
//! | `categories` | `account_id\|category_id` |
//! | `images` | `account_id\|image_id` |
//! | `transactions` | `account_id\|wallet_id\|transaction_id` |
//! | `unique_index` | `table\|field\|value` |
//!
//! Backends only implement raw table access ([`RecordStore`]). Constraint
//! checks, timestamps and cascades live in [`Records`] so every backend
//! behaves the same.

pub mod blob;
pub mod database;
pub mod memory;
pub mod paths;
pub mod records;

pub use blob::{BlobPath, BlobStore, FsBlobStore, MemoryBlobStore};
pub use database::RecordDatabase;
pub use memory::MemoryStore;
pub use paths::StoragePaths;
pub use records::{Record, RecordKey, Records, Reference, UNIQUE_INDEX};

/// Errors surfaced by the record and blob stores.
///
/// `NotFound` and `Unavailable` are deliberately separate: a missing row is
/// an answer, an unreachable store is not.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound(e.to_string())
        } else {
            StorageError::Unavailable(e.to_string())
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Read access to raw tables inside one transaction.
pub trait ReadTables {
    fn read(&self, table: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// All rows whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, table: &str, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>>;
}

/// Write access to raw tables inside one transaction.
pub trait Tables: ReadTables {
    fn write(&mut self, table: &str, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Returns whether a row was removed.
    fn remove(&mut self, table: &str, key: &str) -> StorageResult<bool>;

    /// Returns the number of rows removed.
    fn remove_prefix(&mut self, table: &str, prefix: &str) -> StorageResult<usize> {
        let rows = self.scan_prefix(table, prefix)?;
        for (key, _) in &rows {
            self.remove(table, key)?;
        }
        Ok(rows.len())
    }
}

/// A transactional key/value backend for [`Records`].
pub trait RecordStore: Send + Sync {
    /// Run `work` inside one write transaction.
    ///
    /// Commits when `work` returns `Ok`; nothing `work` wrote is visible
    /// afterwards when it returns `Err`.
    fn transact(
        &self,
        work: &mut dyn FnMut(&mut dyn Tables) -> StorageResult<()>,
    ) -> StorageResult<()>;

    /// Run `work` against a consistent read snapshot.
    fn view(&self, work: &mut dyn FnMut(&dyn ReadTables) -> StorageResult<()>)
        -> StorageResult<()>;

    /// Cheap probe used by readiness checks.
    fn health_check(&self) -> StorageResult<()>;
}
