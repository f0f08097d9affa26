//! Durable document storage
//!
//! A store maps a collection name to the serialized JSON array holding every document of
//! that collection. Repositories read a collection once at startup and write the whole
//! array back on each mutation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use super::error::DatabaseError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Raw collection contents, `None` when the collection was never written
    async fn load(&self, collection: &str) -> Result<Option<String>, DatabaseError>;

    /// Replace the whole collection
    async fn save(&self, collection: &str, contents: &str) -> Result<(), DatabaseError>;

    /// Cheap liveness probe used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// One `{collection}.json` file per collection under `data_dir`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", collection))
    }
}

#[async_trait]
impl DocumentStore for JsonFileStore {
    async fn load(&self, collection: &str) -> Result<Option<String>, DatabaseError> {
        match tokio::fs::read_to_string(self.path_for(collection)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DatabaseError::io(collection, e)),
        }
    }

    async fn save(&self, collection: &str, contents: &str) -> Result<(), DatabaseError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| DatabaseError::io(collection, e))?;

        // Readers never observe a half-written file
        let target = self.path_for(collection);
        let tmp = self.data_dir.join(format!(".{}.json.tmp", collection));
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| DatabaseError::io(collection, e))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| DatabaseError::io(collection, e))?;

        debug!(collection = collection, bytes = contents.len(), "Collection persisted");
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| DatabaseError::io("<data_dir>", e))?;
        let meta = tokio::fs::metadata(&self.data_dir)
            .await
            .map_err(|e| DatabaseError::io("<data_dir>", e))?;
        if meta.permissions().readonly() {
            return Err(DatabaseError::io(
                "<data_dir>",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "data dir is read-only"),
            ));
        }
        Ok(())
    }
}

/// Volatile store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a collection before repositories load it
    pub async fn seed(&self, collection: &str, contents: impl Into<String>) {
        self.collections
            .write()
            .await
            .insert(collection.to_string(), contents.into());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, collection: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.collections.read().await.get(collection).cloned())
    }

    async fn save(&self, collection: &str, contents: &str) -> Result<(), DatabaseError> {
        self.collections
            .write()
            .await
            .insert(collection.to_string(), contents.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
