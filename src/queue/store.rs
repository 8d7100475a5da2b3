//! # Queue Storage Backends
//!
//! The queue persists through a [`QueueStore`]: one logical storage slot
//! holding the whole serialized collection. There are no partial updates;
//! every mutation rewrites the full array, so a backend only needs three
//! operations.
//!
//! [`FileStore`] is the production backend — a single JSON file in the
//! platform data directory, replaced atomically on every save.
//! [`MemoryStore`] backs tests and ephemeral embedders.

use crate::error::NetworkError;
use crate::types::QueuedRequest;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// File name of the persisted queue inside the storage directory
const QUEUE_FILE: &str = "offline_queue.json";

/// Whole-collection persistence for queued requests
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Read the full collection. An absent slot loads as empty; a broken
    /// slot is an error for the caller to absorb.
    async fn load(&self) -> Result<Vec<QueuedRequest>, NetworkError>;

    /// Replace the full collection in one write
    async fn save(&self, requests: &[QueuedRequest]) -> Result<(), NetworkError>;

    /// Delete the collection entirely
    async fn clear(&self) -> Result<(), NetworkError>;
}

/// JSON-file backend under the platform data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `storage_dir`, or at the platform data
    /// directory when none is given. Creates the directory if needed.
    pub fn open(storage_dir: Option<PathBuf>) -> Result<Self, NetworkError> {
        let dir = storage_dir.unwrap_or_else(Self::default_dir);
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(QUEUE_FILE),
        })
    }

    /// Platform-specific default directory for client data
    fn default_dir() -> PathBuf {
        let mut dir = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        dir.push("stride");
        dir
    }

    /// Location of the persisted queue file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl QueueStore for FileStore {
    async fn load(&self) -> Result<Vec<QueuedRequest>, NetworkError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, requests: &[QueuedRequest]) -> Result<(), NetworkError> {
        let bytes = serde_json::to_vec(requests)?;
        // Write-then-rename so a crash mid-save never leaves a torn file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), NetworkError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory backend: a single serialized cell, mirroring the one-slot
/// shape of the file store.
#[derive(Default)]
pub struct MemoryStore {
    cell: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn load(&self) -> Result<Vec<QueuedRequest>, NetworkError> {
        match self.cell.read().await.as_deref() {
            Some(raw) => Ok(serde_json::from_str(raw)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, requests: &[QueuedRequest]) -> Result<(), NetworkError> {
        let raw = serde_json::to_string(requests)?;
        *self.cell.write().await = Some(raw);
        Ok(())
    }

    async fn clear(&self) -> Result<(), NetworkError> {
        *self.cell.write().await = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HttpMethod, Priority};

    fn request(id: &str) -> QueuedRequest {
        QueuedRequest {
            id: id.to_string(),
            url: "https://api.stride.app/v1/profile".to_string(),
            method: HttpMethod::Post,
            body: None,
            headers: None,
            timestamp: 1_700_000_000_000,
            retry_count: 0,
            priority: Priority::Normal,
        }
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(Some(dir.path().to_path_buf())).unwrap();

        assert!(store.load().await.unwrap().is_empty());

        store.save(&[request("req_1_a"), request("req_2_b")]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "req_1_a");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(Some(dir.path().to_path_buf())).unwrap();
        tokio::fs::write(store.path(), b"{ not json").await.unwrap();

        assert!(matches!(
            store.load().await,
            Err(NetworkError::Serialization { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_store_clear_when_absent_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(Some(dir.path().to_path_buf())).unwrap();
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().await.unwrap().is_empty());

        store.save(&[request("req_3_c")]).await.unwrap();
        assert_eq!(store.load().await.unwrap()[0].id, "req_3_c");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }
}
