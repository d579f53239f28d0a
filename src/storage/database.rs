// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded record database backed by redb (pure Rust, ACID).
//!
//! Every table maps a `&str` key to JSON bytes. One [`RecordStore::transact`]
//! call is exactly one redb write transaction, so a batch insert either
//! commits as a whole or leaves nothing behind.

use std::path::Path;

use redb::{
    Database, ReadTransaction, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};

use super::{ReadTables, RecordStore, StorageError, StorageResult, Tables};
use crate::models::TABLES;

type RowTable<'a> = TableDefinition<'a, &'static str, &'static [u8]>;

fn table(name: &str) -> RowTable<'_> {
    TableDefinition::new(name)
}

macro_rules! unavailable_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for StorageError {
                fn from(e: $source) -> Self {
                    StorageError::Unavailable(e.to_string())
                }
            }
        )*
    };
}

unavailable_from!(
    redb::Error,
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

fn scan<T>(rows: &T, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut found = Vec::new();
    for entry in rows.range(prefix..)? {
        let (key, value) = entry?;
        let key = key.value();
        if !key.starts_with(prefix) {
            break;
        }
        found.push((key.to_string(), value.value().to_vec()));
    }
    Ok(found)
}

struct WriteTables<'t> {
    txn: &'t WriteTransaction,
}

impl ReadTables for WriteTables<'_> {
    fn read(&self, name: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let rows = self.txn.open_table(table(name))?;
        let value = rows.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn scan_prefix(&self, name: &str, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let rows = self.txn.open_table(table(name))?;
        scan(&rows, prefix)
    }
}

impl Tables for WriteTables<'_> {
    fn write(&mut self, name: &str, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut rows = self.txn.open_table(table(name))?;
        rows.insert(key, value)?;
        Ok(())
    }

    fn remove(&mut self, name: &str, key: &str) -> StorageResult<bool> {
        let mut rows = self.txn.open_table(table(name))?;
        let removed = rows.remove(key)?.is_some();
        Ok(removed)
    }
}

struct SnapshotTables {
    txn: ReadTransaction,
}

impl ReadTables for SnapshotTables {
    fn read(&self, name: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let rows = self.txn.open_table(table(name))?;
        let value = rows.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn scan_prefix(&self, name: &str, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let rows = self.txn.open_table(table(name))?;
        scan(&rows, prefix)
    }
}

/// Record store persisted in a single redb file.
pub struct RecordDatabase {
    db: Database,
}

impl RecordDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        for name in TABLES {
            let _ = write_txn.open_table(table(name))?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "record database opened");
        Ok(Self { db })
    }
}

impl RecordStore for RecordDatabase {
    fn transact(
        &self,
        work: &mut dyn FnMut(&mut dyn Tables) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut tables = WriteTables { txn: &write_txn };
            // Dropping an uncommitted write transaction aborts it
            work(&mut tables)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn view(
        &self,
        work: &mut dyn FnMut(&dyn ReadTables) -> StorageResult<()>,
    ) -> StorageResult<()> {
        let tables = SnapshotTables {
            txn: self.db.begin_read()?,
        };
        work(&tables)
    }

    fn health_check(&self) -> StorageResult<()> {
        let read_txn = self.db.begin_read()?;
        let _ = read_txn.open_table(table(crate::storage::UNIQUE_INDEX))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Credential, Wallet};
    use crate::storage::{RecordKey, Records};
    use chrono::Utc;
    use tempfile::tempdir;

    fn account(id: &str, email: &str) -> Account {
        Account {
            account_id: id.to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            credential: Credential::new("c".to_string()),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn wallet(account_id: &str, id: &str) -> Wallet {
        Wallet {
            wallet_id: id.to_string(),
            account_id: account_id.to_string(),
            name: id.to_string(),
            description: String::new(),
            access_credential: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn open_creates_file_and_tables() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("records.redb");
        let db = RecordDatabase::open(&path).unwrap();
        assert!(path.exists());
        db.health_check().unwrap();
    }

    #[test]
    fn records_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("records.redb");
        {
            let db = RecordDatabase::open(&path).unwrap();
            db.create(account("a1", "ada@example.com")).unwrap();
        }
        let db = RecordDatabase::open(&path).unwrap();
        let stored: Account = db.get(&RecordKey::new(["a1"])).unwrap();
        assert_eq!(stored.email, "ada@example.com");
    }

    #[test]
    fn failed_transaction_leaves_no_rows() {
        let dir = tempdir().unwrap();
        let db = RecordDatabase::open(&dir.path().join("records.redb")).unwrap();
        db.create(account("a1", "ada@example.com")).unwrap();

        let err = db
            .create_batch(vec![wallet("a1", "w1"), wallet("missing", "w2")])
            .unwrap_err();
        assert!(err.is_conflict());
        assert!(db.list::<Wallet>(&RecordKey::new(["a1"])).unwrap().is_empty());
    }

    #[test]
    fn prefix_scan_stops_at_scope_boundary() {
        let dir = tempdir().unwrap();
        let db = RecordDatabase::open(&dir.path().join("records.redb")).unwrap();
        db.create(account("a1", "one@example.com")).unwrap();
        db.create(account("a10", "ten@example.com")).unwrap();
        db.create(wallet("a1", "w1")).unwrap();
        db.create(wallet("a10", "w2")).unwrap();

        let wallets: Vec<Wallet> = db.list(&RecordKey::new(["a1"])).unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].wallet_id, "w1");
    }
}
