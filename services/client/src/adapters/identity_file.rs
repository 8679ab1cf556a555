//! services/client/src/adapters/identity_file.rs
//!
//! This module contains the durable key-value adapter used to persist the
//! current user identity. It implements the `KeyValueStore` port by keeping a
//! small JSON object on disk and replacing it atomically on every write.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use stylesense_core::ports::{KeyValueStore, PortError, PortResult};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// A `KeyValueStore` backed by a single JSON file.
pub struct JsonFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a new `JsonFileStore`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_raw(&self) -> PortResult<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }

    fn parse(&self, raw: &[u8]) -> PortResult<BTreeMap<String, String>> {
        serde_json::from_slice(raw).map_err(|e| {
            PortError::Unexpected(format!(
                "Corrupt store file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn read_all(&self) -> PortResult<BTreeMap<String, String>> {
        match self.read_raw().await? {
            Some(raw) => self.parse(&raw),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Writes and syncs a sibling temp file, then renames it over the real one.
    async fn write_all(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let raw = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(io_error)?;
        file.write_all(&raw).await.map_err(io_error)?;
        file.sync_all().await.map_err(io_error)?;
        drop(file);
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_error)?;
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> PortError {
    match e.kind() {
        ErrorKind::PermissionDenied => PortError::PermissionDenied(e.to_string()),
        _ => PortError::Unexpected(e.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let mut entries = self.read_all().await?;
        Ok(entries.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = match self.read_raw().await? {
            Some(raw) => self.parse(&raw).unwrap_or_else(|e| {
                warn!("Overwriting unreadable store: {}", e);
                BTreeMap::new()
            }),
            None => BTreeMap::new(),
        };
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries).await?;
        debug!(key, path = %self.path.display(), "Persisted value");
        Ok(())
    }
}
