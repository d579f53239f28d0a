// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blob storage for image payloads.
//!
//! Blobs are addressed by [`BlobPath`], which always has the shape
//! `users/{account_id}/images/{image_id}`. [`FsBlobStore`] keeps them as
//! plain files under a root directory; [`MemoryBlobStore`] keeps them in a
//! map and can be told to fail.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use uuid::Uuid;

use super::{StorageError, StorageResult};

/// Location of a blob inside a blob store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    pub fn image(account_id: &str, image_id: &str) -> Self {
        Self(format!("users/{account_id}/images/{image_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlobPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An object store for binary payloads.
pub trait BlobStore: Send + Sync {
    /// Write `bytes` at `path`, replacing any previous blob.
    fn put(&self, path: &BlobPath, bytes: &[u8]) -> StorageResult<()>;

    fn get(&self, path: &BlobPath) -> StorageResult<Vec<u8>>;

    /// Missing blobs are reported as `NotFound`.
    fn delete(&self, path: &BlobPath) -> StorageResult<()>;

    fn health_check(&self) -> StorageResult<()>;
}

// =============================================================================
// Filesystem
// =============================================================================

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        tracing::info!(root = %root.display(), "blob store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &BlobPath) -> PathBuf {
        self.root.join(path.as_str())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()
}

impl BlobStore for FsBlobStore {
    fn put(&self, path: &BlobPath, bytes: &[u8]) -> StorageResult<()> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // Each write gets its own temp file, renamed over the target when complete
        let temp_path = target.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        let written = write_file(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &target));
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn get(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        fs::read(self.resolve(path)).map_err(|e| match StorageError::from(e) {
            StorageError::NotFound(_) => StorageError::NotFound(format!("blob {path}")),
            other => other,
        })
    }

    fn delete(&self, path: &BlobPath) -> StorageResult<()> {
        fs::remove_file(self.resolve(path)).map_err(|e| match StorageError::from(e) {
            StorageError::NotFound(_) => StorageError::NotFound(format!("blob {path}")),
            other => other,
        })
    }

    /// Write-read-delete round trip under the root.
    fn health_check(&self) -> StorageResult<()> {
        let probe = self.root.join(".health_check");
        let data = b"health_check_data";

        fs::write(&probe, data)?;
        let read_back = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read_back != data {
            return Err(StorageError::Unavailable(
                "blob store health check data mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// Blob store kept in memory, with switches to inject failures.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<BlobPath, Vec<u8>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Every operation fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, path: &BlobPath) -> bool {
        self.blobs
            .lock()
            .map(|blobs| blobs.contains_key(path))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, flag: &AtomicBool, operation: &str) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) || flag.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "blob {operation} rejected by in-memory store"
            )));
        }
        Ok(())
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<BlobPath, Vec<u8>>>> {
        self.blobs
            .lock()
            .map_err(|_| StorageError::Unavailable("blob store lock poisoned".to_string()))
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, path: &BlobPath, bytes: &[u8]) -> StorageResult<()> {
        self.check(&self.fail_puts, "put")?;
        self.lock()?.insert(path.clone(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &BlobPath) -> StorageResult<Vec<u8>> {
        self.check(&self.unavailable, "get")?;
        self.lock()?
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("blob {path}")))
    }

    fn delete(&self, path: &BlobPath) -> StorageResult<()> {
        self.check(&self.fail_deletes, "delete")?;
        self.lock()?
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("blob {path}")))
    }

    fn health_check(&self) -> StorageResult<()> {
        self.check(&self.unavailable, "health check")
    }
}
