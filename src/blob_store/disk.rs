/// Disk-based blob storage backend
use crate::{
    blob_store::{locator::validate_storage_path, BlobBackend, BlobLocator},
    error::{CmsError, CmsResult},
};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Disk storage backend
///
/// Stores blobs on the local filesystem, mirroring the storage path
/// (`gallery/<id>_photo.jpg`) as directories under the base path.
#[derive(Clone)]
pub struct DiskBlobBackend {
    base_path: PathBuf,
    public_base_url: String,
}

impl DiskBlobBackend {
    /// Create a new disk storage backend
    pub fn new(base_path: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path,
            public_base_url: public_base_url.into(),
        }
    }

    /// Get the file path for a storage path
    fn get_blob_path(&self, path: &str) -> CmsResult<PathBuf> {
        validate_storage_path(path)
            .map_err(|e| CmsError::Validation(format!("Invalid blob path: {}", e)))?;

        Ok(path
            .split('/')
            .fold(self.base_path.clone(), |acc, segment| acc.join(segment)))
    }

    /// Ensure the directory for a blob exists
    async fn ensure_blob_dir(&self, path: &str) -> CmsResult<PathBuf> {
        let blob_path = self.get_blob_path(path)?;
        if let Some(parent) = blob_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                CmsError::StorageWrite(format!("Failed to create blob directory: {}", e))
            })?;
        }
        Ok(blob_path)
    }
}

#[async_trait]
impl BlobBackend for DiskBlobBackend {
    async fn put(&self, path: &str, data: Vec<u8>, _mime_type: &str) -> CmsResult<()> {
        let blob_path = self.ensure_blob_dir(path).await?;

        fs::write(&blob_path, data).await.map_err(|e| {
            CmsError::StorageWrite(format!("Failed to write blob {}: {}", path, e))
        })?;

        Ok(())
    }

    async fn get(&self, path: &str) -> CmsResult<Option<Vec<u8>>> {
        let blob_path = self.get_blob_path(path)?;

        match fs::read(&blob_path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CmsError::BlobStorage(format!(
                "Failed to read blob {}: {}",
                path, e
            ))),
        }
    }

    async fn delete(&self, path: &str) -> CmsResult<()> {
        let blob_path = self.get_blob_path(path)?;

        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CmsError::NotFound(format!("Blob {} not found", path)))
            }
            Err(e) => Err(CmsError::BlobStorage(format!(
                "Failed to delete blob {}: {}",
                path, e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> CmsResult<bool> {
        let blob_path = self.get_blob_path(path)?;
        Ok(fs::try_exists(&blob_path).await.unwrap_or(false))
    }

    fn retrievable_url(&self, path: &str) -> String {
        BlobLocator::for_path(&self.public_base_url, path)
            .as_str()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn backend(dir: &std::path::Path) -> DiskBlobBackend {
        DiskBlobBackend::new(dir.to_path_buf(), "https://cdn.example.com/blobs")
    }

    #[tokio::test]
    async fn test_put_and_get_blob() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let data = b"test blob data".to_vec();
        backend.put("gallery/1_a.png", data.clone(), "image/png").await.unwrap();

        let retrieved = backend.get("gallery/1_a.png").await.unwrap();
        assert_eq!(retrieved, Some(data));
        assert!(dir.path().join("gallery").join("1_a.png").exists());
    }

    #[tokio::test]
    async fn test_get_nonexistent_blob() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let result = backend.get("gallery/none.png").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_blob() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        backend.put("news/cover.jpg", b"to be deleted".to_vec(), "image/jpeg").await.unwrap();
        assert!(backend.exists("news/cover.jpg").await.unwrap());

        backend.delete("news/cover.jpg").await.unwrap();
        assert!(!backend.exists("news/cover.jpg").await.unwrap());

        // Second delete reports the object as absent
        let err = backend.delete("news/cover.jpg").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempdir().unwrap();
        let backend = backend(dir.path());

        let result = backend.put("../escape.png", vec![1], "image/png").await;
        assert!(matches!(result, Err(CmsError::Validation(_))));
    }

    #[test]
    fn test_retrievable_url() {
        let backend = DiskBlobBackend::new(PathBuf::from("/tmp"), "https://cdn.example.com/blobs/");
        assert_eq!(
            backend.retrievable_url("gallery/1_a b.png"),
            "https://cdn.example.com/blobs/o/gallery%2F1_a%20b.png?alt=media"
        );
    }
}
