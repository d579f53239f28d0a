// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory record store.
//!
//! Behaves like [`RecordDatabase`](super::RecordDatabase) for everything
//! [`Records`](super::Records) relies on: writes are staged on a copy and
//! only swapped in when the transaction succeeds. `set_unavailable` makes
//! every call fail the way an unreachable database would.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{ReadTables, RecordStore, StorageError, StorageResult, Tables};

type TableMap = HashMap<String, BTreeMap<String, Vec<u8>>>;

impl ReadTables for TableMap {
    fn read(&self, table: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.get(table).and_then(|rows| rows.get(key)).cloned())
    }

    fn scan_prefix(&self, table: &str, prefix: &str) -> StorageResult<Vec<(String, Vec<u8>)>> {
        let Some(rows) = self.get(table) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

impl Tables for TableMap {
    fn write(&mut self, table: &str, key: &str, value: &[u8]) -> StorageResult<()> {
        self.entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&mut self, table: &str, key: &str) -> StorageResult<bool> {
        Ok(self
            .get_mut(table)
            .is_some_and(|rows| rows.remove(key).is_some()))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<TableMap>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing the connection to the store.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Total rows in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .map(|tables| tables.get(table).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, TableMap>> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryStore {
    fn transact(
        &self,
        work: &mut dyn FnMut(&mut dyn Tables) -> StorageResult<()>,
    ) -> StorageResult<()> {
        self.ensure_available()?;
        let mut tables = self.lock()?;
        let mut staged = tables.clone();
        work(&mut staged)?;
        *tables = staged;
        Ok(())
    }

    fn view(
        &self,
        work: &mut dyn FnMut(&dyn ReadTables) -> StorageResult<()>,
    ) -> StorageResult<()> {
        self.ensure_available()?;
        let tables = self.lock()?;
        work(&*tables)
    }

    fn health_check(&self) -> StorageResult<()> {
        self.ensure_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_discards_staged_writes() {
        let store = MemoryStore::new();
        let result = store.transact(&mut |tables: &mut dyn Tables| {
            tables.write("wallets", "a1|w1", b"{}")?;
            Err(StorageError::Conflict("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(store.row_count("wallets"), 0);
    }

    #[test]
    fn unavailable_store_rejects_reads_and_writes() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let read = store.view(&mut |_: &dyn ReadTables| Ok(()));
        assert!(matches!(read, Err(StorageError::Unavailable(_))));
        assert!(store.health_check().is_err());

        store.set_unavailable(false);
        store.health_check().unwrap();
    }

    #[test]
    fn scan_prefix_only_returns_matching_keys() {
        let mut tables = TableMap::new();
        tables.write("t", "a1|x", b"1").unwrap();
        tables.write("t", "a10|y", b"2").unwrap();
        tables.write("t", "a1|z", b"3").unwrap();

        let rows = tables.scan_prefix("t", "a1|").unwrap();
        let keys: Vec<&str> = rows.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["a1|x", "a1|z"]);
    }
}
