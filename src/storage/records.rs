// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed record access on top of a raw [`RecordStore`].
//!
//! Every entity implements [`Record`], which tells the store where the entity
//! lives, which rows it owns and which rows it points at. [`Records`] turns
//! that description into get/list/create/update/delete operations and
//! enforces, inside the same write transaction:
//!
//! - **Primary keys**: creating an existing key is a `Conflict`
//! - **References**: a row pointing at a missing row is a `Conflict`
//! - **Unique values**: tracked in the `unique_index` table
//! - **Cascades**: deleting a row removes every row in the `CASCADE`
//!   tables whose key starts with the deleted key
//! - **Timestamps**: `created_at` is set once, `updated_at` on every write

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::{ReadTables, RecordStore, StorageError, StorageResult, Tables};

/// Table mapping `table|field|value` to the key of the owning row.
pub const UNIQUE_INDEX: &str = "unique_index";

const SEPARATOR: char = '|';

/// Composite storage key (`part|part|...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = String::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                key.push(SEPARATOR);
            }
            key.push_str(part.as_ref());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix matching every key nested under this one.
    pub fn scope(&self) -> String {
        format!("{}{SEPARATOR}", self.0)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row another row depends on.
#[derive(Debug, Clone)]
pub struct Reference {
    pub table: &'static str,
    pub key: RecordKey,
}

/// An entity persisted as one JSON row.
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: &'static str;

    /// Tables whose rows are nested under this record's key and are removed
    /// with it.
    const CASCADE: &'static [&'static str] = &[];

    fn key(&self) -> RecordKey;

    fn created_at(&self) -> DateTime<Utc>;

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

    /// `(field, value)` pairs that must be unique across the table.
    fn unique_values(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

fn unique_key(table: &str, field: &str, value: &str) -> String {
    format!("{table}{SEPARATOR}{field}{SEPARATOR}{value}")
}

fn not_found<R: Record>(key: &RecordKey) -> StorageError {
    StorageError::NotFound(format!("{} {key}", R::TABLE))
}

fn decode<R: Record>(bytes: &[u8]) -> StorageResult<R> {
    Ok(serde_json::from_slice(bytes)?)
}

fn check_references<T, R>(tables: &T, record: &R) -> StorageResult<()>
where
    T: ReadTables + ?Sized,
    R: Record,
{
    for reference in record.references() {
        if tables.read(reference.table, reference.key.as_str())?.is_none() {
            return Err(StorageError::Conflict(format!(
                "{} {} references missing {} {}",
                R::TABLE,
                record.key(),
                reference.table,
                reference.key
            )));
        }
    }
    Ok(())
}

fn claim_unique_values<R: Record>(tables: &mut dyn Tables, record: &R) -> StorageResult<()> {
    let key = record.key();
    for (field, value) in record.unique_values() {
        let index_key = unique_key(R::TABLE, field, &value);
        match tables.read(UNIQUE_INDEX, &index_key)? {
            Some(owner) if owner != key.as_str().as_bytes() => {
                return Err(StorageError::Conflict(format!(
                    "{} {field} is already in use",
                    R::TABLE
                )));
            }
            Some(_) => {}
            None => tables.write(UNIQUE_INDEX, &index_key, key.as_str().as_bytes())?,
        }
    }
    Ok(())
}

fn release_unique_values<R: Record>(tables: &mut dyn Tables, record: &R) -> StorageResult<()> {
    for (field, value) in record.unique_values() {
        tables.remove(UNIQUE_INDEX, &unique_key(R::TABLE, field, &value))?;
    }
    Ok(())
}

fn insert_new<R: Record>(tables: &mut dyn Tables, record: &R) -> StorageResult<()> {
    let key = record.key();
    if tables.read(R::TABLE, key.as_str())?.is_some() {
        return Err(StorageError::Conflict(format!("{} {key} already exists", R::TABLE)));
    }
    check_references(&*tables, record)?;
    claim_unique_values(tables, record)?;
    tables.write(R::TABLE, key.as_str(), &serde_json::to_vec(record)?)
}

/// Typed operations available on every [`RecordStore`].
pub trait Records {
    fn get<R: Record>(&self, key: &RecordKey) -> StorageResult<R>;

    /// Every record of type `R` nested under `scope`, oldest first.
    fn list<R: Record>(&self, scope: &RecordKey) -> StorageResult<Vec<R>>;

    fn find_unique<R: Record>(&self, field: &str, value: &str) -> StorageResult<R>;

    fn create<R: Record>(&self, record: R) -> StorageResult<R>;

    /// Insert all records in one transaction, then re-read them in
    /// submission order. Any violation rejects the whole batch.
    fn create_batch<R: Record>(&self, records: Vec<R>) -> StorageResult<Vec<R>>;

    /// Replace an existing record, keeping its `created_at`.
    fn update<R: Record>(&self, record: R) -> StorageResult<R>;

    /// Remove a record and cascade to the rows it owns. Returns the removed
    /// record.
    fn delete<R: Record>(&self, key: &RecordKey) -> StorageResult<R>;

    /// Remove every record of type `R` nested under `scope`.
    fn delete_scope<R: Record>(&self, scope: &RecordKey) -> StorageResult<usize>;
}

impl<S: RecordStore + ?Sized> Records for S {
    fn get<R: Record>(&self, key: &RecordKey) -> StorageResult<R> {
        let mut found = None;
        self.view(&mut |tables: &dyn ReadTables| {
            found = tables.read(R::TABLE, key.as_str())?;
            Ok(())
        })?;
        match found {
            Some(bytes) => decode(&bytes),
            None => Err(not_found::<R>(key)),
        }
    }

    fn list<R: Record>(&self, scope: &RecordKey) -> StorageResult<Vec<R>> {
        let mut rows = Vec::new();
        self.view(&mut |tables: &dyn ReadTables| {
            rows = tables.scan_prefix(R::TABLE, &scope.scope())?;
            Ok(())
        })?;
        let mut records = rows
            .iter()
            .map(|(_, bytes)| decode::<R>(bytes))
            .collect::<StorageResult<Vec<R>>>()?;
        records.sort_by_key(|record| record.created_at());
        Ok(records)
    }

    fn find_unique<R: Record>(&self, field: &str, value: &str) -> StorageResult<R> {
        let mut found = None;
        self.view(&mut |tables: &dyn ReadTables| {
            found = match tables.read(UNIQUE_INDEX, &unique_key(R::TABLE, field, value))? {
                Some(owner) => tables.read(R::TABLE, &String::from_utf8_lossy(&owner))?,
                None => None,
            };
            Ok(())
        })?;
        match found {
            Some(bytes) => decode(&bytes),
            None => Err(StorageError::NotFound(format!("{} by {field}", R::TABLE))),
        }
    }

    fn create<R: Record>(&self, record: R) -> StorageResult<R> {
        let key = record.key();
        self.create_batch(vec![record])?
            .pop()
            .ok_or_else(|| not_found::<R>(&key))
    }

    fn create_batch<R: Record>(&self, mut records: Vec<R>) -> StorageResult<Vec<R>> {
        if records.is_empty() {
            return Ok(records);
        }

        let now = Utc::now();
        for record in &mut records {
            record.set_timestamps(now, now);
        }

        self.transact(&mut |tables: &mut dyn Tables| {
            for record in &records {
                insert_new(tables, record)?;
            }
            Ok(())
        })?;

        // Return what the store holds, not what was submitted
        let keys: Vec<RecordKey> = records.iter().map(Record::key).collect();
        let mut stored = Vec::with_capacity(keys.len());
        self.view(&mut |tables: &dyn ReadTables| {
            stored.clear();
            for key in &keys {
                let bytes = tables
                    .read(R::TABLE, key.as_str())?
                    .ok_or_else(|| not_found::<R>(key))?;
                stored.push(decode::<R>(&bytes)?);
            }
            Ok(())
        })?;
        Ok(stored)
    }

    fn update<R: Record>(&self, mut record: R) -> StorageResult<R> {
        let key = record.key();
        let now = Utc::now();

        self.transact(&mut |tables: &mut dyn Tables| {
            let existing: R = match tables.read(R::TABLE, key.as_str())? {
                Some(bytes) => decode(&bytes)?,
                None => return Err(not_found::<R>(&key)),
            };
            record.set_timestamps(existing.created_at(), now);
            check_references(&*tables, &record)?;
            release_unique_values(tables, &existing)?;
            claim_unique_values(tables, &record)?;
            tables.write(R::TABLE, key.as_str(), &serde_json::to_vec(&record)?)
        })?;

        self.get(&key)
    }

    fn delete<R: Record>(&self, key: &RecordKey) -> StorageResult<R> {
        let mut removed = None;
        self.transact(&mut |tables: &mut dyn Tables| {
            let bytes = tables
                .read(R::TABLE, key.as_str())?
                .ok_or_else(|| not_found::<R>(key))?;
            let record: R = decode(&bytes)?;
            release_unique_values(tables, &record)?;
            tables.remove(R::TABLE, key.as_str())?;
            for table in R::CASCADE {
                tables.remove_prefix(table, &key.scope())?;
            }
            removed = Some(record);
            Ok(())
        })?;
        removed.ok_or_else(|| not_found::<R>(key))
    }

    fn delete_scope<R: Record>(&self, scope: &RecordKey) -> StorageResult<usize> {
        let mut count = 0;
        self.transact(&mut |tables: &mut dyn Tables| {
            let rows = tables.scan_prefix(R::TABLE, &scope.scope())?;
            for (key, bytes) in &rows {
                let record: R = decode(bytes)?;
                release_unique_values(tables, &record)?;
                tables.remove(R::TABLE, key)?;
            }
            count = rows.len();
            Ok(())
        })?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Credential, Session, Transaction, Wallet};
    use crate::storage::MemoryStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

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
            name: format!("wallet {id}"),
            description: String::new(),
            access_credential: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn session(account_id: &str, token: &str) -> Session {
        Session {
            session_id: format!("s-{token}"),
            account_id: account_id.to_string(),
            original: "seed".to_string(),
            token: token.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn key_scope_appends_separator() {
        let key = RecordKey::new(["a1", "w1"]);
        assert_eq!(key.as_str(), "a1|w1");
        assert_eq!(key.scope(), "a1|w1|");
    }

    #[test]
    fn get_distinguishes_missing_rows() {
        let store = MemoryStore::new();
        let err = store
            .get::<Account>(&RecordKey::new(["nobody"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn create_rejects_duplicate_unique_value() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();

        let err = store.create(account("a2", "ada@example.com")).unwrap_err();
        assert!(err.is_conflict());
        assert!(store.get::<Account>(&RecordKey::new(["a2"])).unwrap_err().is_not_found());
    }

    #[test]
    fn create_rejects_missing_reference() {
        let store = MemoryStore::new();
        let err = store.create(wallet("ghost", "w1")).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();

        // Third item repeats the first key
        let batch = vec![wallet("a1", "w1"), wallet("a1", "w2"), wallet("a1", "w1")];
        let err = store.create_batch(batch).unwrap_err();
        assert!(err.is_conflict());

        let wallets: Vec<Wallet> = store.list(&RecordKey::new(["a1"])).unwrap();
        assert!(wallets.is_empty());
    }

    #[test]
    fn batch_returns_rows_in_submission_order() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();

        let created = store
            .create_batch(vec![wallet("a1", "w3"), wallet("a1", "w1"), wallet("a1", "w2")])
            .unwrap();
        let ids: Vec<&str> = created.iter().map(|w| w.wallet_id.as_str()).collect();
        assert_eq!(ids, ["w3", "w1", "w2"]);
    }

    #[test]
    fn update_keeps_created_at_and_requires_existing_row() {
        let store = MemoryStore::new();
        let created = store.create(account("a1", "ada@example.com")).unwrap();

        let mut changed = created.clone();
        changed.name = "Grace".to_string();
        let updated = store.update(changed).unwrap();
        assert_eq!(updated.name, "Grace");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let err = store.update(account("a9", "x@example.com")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_moves_unique_claims() {
        let store = MemoryStore::new();
        let first = store.create(account("a1", "one@example.com")).unwrap();
        store.create(account("a2", "two@example.com")).unwrap();

        let mut taken = first.clone();
        taken.email = "two@example.com".to_string();
        assert!(store.update(taken).unwrap_err().is_conflict());

        let mut moved = first;
        moved.email = "three@example.com".to_string();
        store.update(moved).unwrap();

        // The old address is free again
        store.create(account("a3", "one@example.com")).unwrap();
        let found: Account = store.find_unique("email", "three@example.com").unwrap();
        assert_eq!(found.account_id, "a1");
    }

    #[test]
    fn delete_cascades_to_nested_rows() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();
        store.create(wallet("a1", "w1")).unwrap();
        store.create(session("a1", "t1")).unwrap();
        store.create(account("a2", "bob@example.com")).unwrap();
        store.create(wallet("a2", "w2")).unwrap();

        store.delete::<Account>(&RecordKey::new(["a1"])).unwrap();

        assert!(store.list::<Wallet>(&RecordKey::new(["a1"])).unwrap().is_empty());
        assert!(store.list::<Session>(&RecordKey::new(["a1"])).unwrap().is_empty());
        assert_eq!(store.list::<Wallet>(&RecordKey::new(["a2"])).unwrap().len(), 1);
        // Unique claims go with the account
        store.create(account("a3", "ada@example.com")).unwrap();
    }

    #[test]
    fn wallet_delete_removes_its_transactions() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();
        store.create(wallet("a1", "w1")).unwrap();
        let image = crate::models::Image {
            image_id: "i1".to_string(),
            account_id: "a1".to_string(),
            name: "receipt".to_string(),
            description: String::new(),
            url: None,
            file_name: "r.png".to_string(),
            format: "png".to_string(),
            raw_image: vec![1, 2, 3],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create(image).unwrap();
        let category = crate::models::Category {
            category_id: "c1".to_string(),
            account_id: "a1".to_string(),
            image_id: "i1".to_string(),
            name: "Food".to_string(),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create(category).unwrap();
        let transaction = Transaction {
            transaction_id: "t1".to_string(),
            account_id: "a1".to_string(),
            wallet_id: "w1".to_string(),
            category_id: "c1".to_string(),
            amount: Decimal::new(-1250, 2),
            description: "lunch".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create(transaction).unwrap();

        store.delete::<Wallet>(&RecordKey::new(["a1", "w1"])).unwrap();
        assert!(store.list::<Transaction>(&RecordKey::new(["a1"])).unwrap().is_empty());
    }

    #[test]
    fn delete_scope_counts_removed_rows() {
        let store = MemoryStore::new();
        store.create(account("a1", "ada@example.com")).unwrap();
        store.create(session("a1", "t1")).unwrap();
        store.create(session("a1", "t2")).unwrap();

        let removed = store.delete_scope::<Session>(&RecordKey::new(["a1"])).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.delete_scope::<Session>(&RecordKey::new(["a1"])).unwrap(), 0);
    }
}
