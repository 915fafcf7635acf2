/// In-memory blob storage backend
use crate::{
    blob_store::{BlobBackend, BlobLocator},
    error::{CmsError, CmsResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Stored object with its content type
#[derive(Debug, Clone)]
struct StoredBlob {
    data: Vec<u8>,
    mime_type: String,
}

/// Blob backend kept in process memory; clones share storage
#[derive(Clone)]
pub struct MemoryBlobBackend {
    blobs: Arc<RwLock<HashMap<String, StoredBlob>>>,
    public_base_url: String,
}

impl MemoryBlobBackend {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            public_base_url: public_base_url.into(),
        }
    }

    /// Storage paths currently held, sorted
    pub async fn paths(&self) -> Vec<String> {
        let blobs = self.blobs.read().await;
        let mut paths: Vec<String> = blobs.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Content type recorded for a path
    pub async fn mime_type(&self, path: &str) -> Option<String> {
        let blobs = self.blobs.read().await;
        blobs.get(path).map(|b| b.mime_type.clone())
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn put(&self, path: &str, data: Vec<u8>, mime_type: &str) -> CmsResult<()> {
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            path.to_string(),
            StoredBlob {
                data,
                mime_type: mime_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, path: &str) -> CmsResult<Option<Vec<u8>>> {
        let blobs = self.blobs.read().await;
        Ok(blobs.get(path).map(|b| b.data.clone()))
    }

    async fn delete(&self, path: &str) -> CmsResult<()> {
        let mut blobs = self.blobs.write().await;
        match blobs.remove(path) {
            Some(_) => Ok(()),
            None => Err(CmsError::NotFound(format!("Blob {} not found", path))),
        }
    }

    async fn exists(&self, path: &str) -> CmsResult<bool> {
        let blobs = self.blobs.read().await;
        Ok(blobs.contains_key(path))
    }

    fn retrievable_url(&self, path: &str) -> String {
        BlobLocator::for_path(&self.public_base_url, path)
            .as_str()
            .to_string()
    }
}
