/// Blob Store Manager
///
/// Uploads binaries under `<folder>/<id>_<filename>` and hands back a
/// retrievable locator; reverses that for deletion. Deletion is advisory:
/// a document delete must never be blocked by blob housekeeping, so every
/// delete outcome is logged and returned, never raised.
use crate::{
    blob_store::{
        disk::DiskBlobBackend, memory::MemoryBlobBackend, BlobBackend, BlobBackendType,
        BlobLocator, BlobStorageConfig, LocatorError,
    },
    error::{CmsError, CmsResult},
    ids,
};
use futures::future::join_all;
use std::sync::Arc;

/// A file to upload
#[derive(Debug, Clone)]
pub struct BlobUpload {
    /// Original filename as supplied by the operator
    pub filename: String,
    pub data: Vec<u8>,
    /// Explicit content type; guessed from the filename when absent
    pub mime_type: Option<String>,
}

impl BlobUpload {
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            data,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Result of a best-effort blob deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobDeleteOutcome {
    /// Object removed
    Deleted { path: String },
    /// Object was already gone; counts as success
    AlreadyAbsent { path: String },
    /// Locator empty, malformed or foreign; nothing was sent to the backend
    Skipped { reason: LocatorError },
    /// Backend failure, logged and swallowed
    Failed { path: String, reason: String },
}

impl BlobDeleteOutcome {
    /// Whether a delete request reached the backend
    pub fn attempted(&self) -> bool {
        !matches!(self, BlobDeleteOutcome::Skipped { .. })
    }

    /// Whether the blob is known to be gone afterwards
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            BlobDeleteOutcome::Deleted { .. } | BlobDeleteOutcome::AlreadyAbsent { .. }
        )
    }
}

/// Main blob store manager
#[derive(Clone)]
pub struct BlobStore {
    config: BlobStorageConfig,
    backend: Arc<dyn BlobBackend>,
}

impl BlobStore {
    /// Create a new blob store with the configured backend
    pub fn new(config: BlobStorageConfig) -> CmsResult<Self> {
        let backend: Arc<dyn BlobBackend> = match &config.backend {
            BlobBackendType::Disk { location } => Arc::new(DiskBlobBackend::new(
                location.clone(),
                config.public_base_url.clone(),
            )),
            BlobBackendType::Memory => {
                Arc::new(MemoryBlobBackend::new(config.public_base_url.clone()))
            }
        };

        Ok(Self { config, backend })
    }

    /// Create a blob store over an externally built backend
    pub fn with_backend(config: BlobStorageConfig, backend: Arc<dyn BlobBackend>) -> Self {
        Self { config, backend }
    }

    /// Upload a file into `folder`
    ///
    /// Validation failures are reported before anything is written; backend
    /// rejections surface as `StorageWrite`.
    pub async fn upload(&self, file: BlobUpload, folder: &str) -> CmsResult<BlobLocator> {
        let size = file.data.len();
        if size == 0 {
            return Err(CmsError::Validation(format!(
                "File {} is empty",
                file.filename
            )));
        }
        if size > self.config.max_blob_size {
            return Err(CmsError::Validation(format!(
                "File {} exceeds maximum size of {} bytes",
                file.filename, self.config.max_blob_size
            )));
        }

        let mime_type = file
            .mime_type
            .clone()
            .or_else(|| guess_mime_type(&file.filename).map(String::from))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.validate_mime_type(&mime_type)?;

        let path = build_storage_path(folder, &file.filename)?;

        self.backend
            .put(&path, file.data, &mime_type)
            .await
            .map_err(|e| match e {
                CmsError::StorageWrite(_) => e,
                other => CmsError::StorageWrite(other.to_string()),
            })?;

        tracing::info!("Uploaded blob {} ({} bytes, {})", path, size, mime_type);

        Ok(BlobLocator::new(self.backend.retrievable_url(&path)))
    }

    /// Upload several files concurrently
    ///
    /// All-or-nothing from the caller's view: if any upload fails, the ones
    /// that succeeded are deleted best-effort and the first error is returned.
    pub async fn upload_many(&self, files: Vec<BlobUpload>, folder: &str) -> CmsResult<Vec<BlobLocator>> {
        let results = join_all(files.into_iter().map(|file| self.upload(file, folder))).await;

        let mut locators = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(locator) => locators.push(locator),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            None => Ok(locators),
            Some(e) => {
                tracing::warn!(
                    "Batch upload to {} failed, removing {} uploaded blob(s): {}",
                    folder,
                    locators.len(),
                    e
                );
                self.delete_all(locators.iter()).await;
                Err(e)
            }
        }
    }

    /// Best-effort deletion of the blob a locator points to
    ///
    /// Only locators issued under the configured public base URL are honoured;
    /// anything else is skipped without contacting the backend.
    pub async fn delete_by_locator(&self, locator: &BlobLocator) -> BlobDeleteOutcome {
        let path = match locator.storage_path_under(&self.config.public_base_url) {
            Ok(path) => path,
            Err(reason) => {
                if reason == LocatorError::Empty {
                    tracing::debug!("Skipping blob cleanup: empty locator");
                } else {
                    tracing::warn!("Skipping blob cleanup for {}: {}", locator, reason);
                }
                return BlobDeleteOutcome::Skipped { reason };
            }
        };

        match self.backend.delete(&path).await {
            Ok(()) => {
                tracing::info!("Deleted blob {}", path);
                BlobDeleteOutcome::Deleted { path }
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!("Blob {} already absent", path);
                BlobDeleteOutcome::AlreadyAbsent { path }
            }
            Err(e) => {
                if self.config.strict_cleanup {
                    tracing::error!("Failed to delete blob {}: {}", path, e);
                } else {
                    tracing::warn!("Failed to delete blob {}: {}", path, e);
                }
                BlobDeleteOutcome::Failed {
                    path,
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Best-effort deletion of many locators, one after another
    pub async fn delete_all<'a, I>(&self, locators: I) -> Vec<BlobDeleteOutcome>
    where
        I: IntoIterator<Item = &'a BlobLocator>,
    {
        let mut outcomes = Vec::new();
        for locator in locators {
            outcomes.push(self.delete_by_locator(locator).await);
        }
        outcomes
    }

    /// Fetch blob content by locator
    pub async fn get(&self, locator: &BlobLocator) -> CmsResult<Option<Vec<u8>>> {
        let path = locator
            .storage_path_under(&self.config.public_base_url)
            .map_err(|e| CmsError::Validation(format!("Invalid locator {}: {}", locator, e)))?;
        self.backend.get(&path).await
    }

    /// Validate MIME type is allowed
    fn validate_mime_type(&self, mime_type: &str) -> CmsResult<()> {
        if self.config.allowed_mime_types.iter().any(|t| t == mime_type) {
            Ok(())
        } else {
            Err(CmsError::Validation(format!(
                "Unsupported MIME type: {}",
                mime_type
            )))
        }
    }
}

/// Build `<folder>/<id>_<sanitized filename>`
fn build_storage_path(folder: &str, filename: &str) -> CmsResult<String> {
    let folder = folder.trim_matches('/');
    let path = format!("{}/{}_{}", folder, ids::new_id(), sanitize_filename(filename));

    crate::blob_store::locator::validate_storage_path(&path)
        .map_err(|e| CmsError::Validation(format!("Invalid upload folder {:?}: {}", folder, e)))?;

    Ok(path)
}

/// Reduce a filename to a single safe path segment
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

fn guess_mime_type(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit('.').next()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    fn memory_config() -> BlobStorageConfig {
        BlobStorageConfig {
            backend: BlobBackendType::Memory,
            public_base_url: "https://store".to_string(),
            max_blob_size: 1024,
            ..Default::default()
        }
    }

    fn create_test_store() -> (BlobStore, MemoryBlobBackend) {
        let backend = MemoryBlobBackend::new("https://store");
        let store = BlobStore::with_backend(memory_config(), Arc::new(backend.clone()));
        (store, backend)
    }

    /// Backend that rejects writes after a number of successes and fails every delete
    struct FlakyBackend {
        inner: MemoryBlobBackend,
        puts_allowed: usize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl BlobBackend for FlakyBackend {
        async fn put(&self, path: &str, data: Vec<u8>, mime_type: &str) -> CmsResult<()> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.puts_allowed {
                return Err(CmsError::BlobStorage("quota exceeded".to_string()));
            }
            self.inner.put(path, data, mime_type).await
        }

        async fn get(&self, path: &str) -> CmsResult<Option<Vec<u8>>> {
            self.inner.get(path).await
        }

        async fn delete(&self, _path: &str) -> CmsResult<()> {
            Err(CmsError::BlobStorage("connection reset".to_string()))
        }

        async fn exists(&self, path: &str) -> CmsResult<bool> {
            self.inner.exists(path).await
        }

        fn retrievable_url(&self, path: &str) -> String {
            self.inner.retrievable_url(path)
        }
    }

    #[tokio::test]
    async fn test_upload_and_get_blob() {
        let (store, backend) = create_test_store();

        let data = b"png bytes".to_vec();
        let locator = store
            .upload(BlobUpload::new("Team Photo.png", data.clone()), "gallery")
            .await
            .unwrap();

        let path = locator.storage_path().unwrap();
        assert!(path.starts_with("gallery/"));
        assert!(path.ends_with("_Team_Photo.png"));
        assert!(locator.as_str().starts_with("https://store/o/gallery%2F"));

        assert_eq!(store.get(&locator).await.unwrap(), Some(data));
        assert_eq!(backend.mime_type(&path).await.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_input() {
        let (store, backend) = create_test_store();

        let empty = store.upload(BlobUpload::new("a.png", vec![]), "gallery").await;
        assert!(matches!(empty, Err(CmsError::Validation(_))));

        let large = store.upload(BlobUpload::new("a.png", vec![0u8; 2048]), "gallery").await;
        assert!(large.unwrap_err().to_string().contains("exceeds maximum"));

        let exe = store
            .upload(BlobUpload::new("tool.exe", vec![1]).with_mime_type("application/exe"), "gallery")
            .await;
        assert!(exe.unwrap_err().to_string().contains("Unsupported MIME type"));

        let traversal = store.upload(BlobUpload::new("a.png", vec![1]), "../etc").await;
        assert!(matches!(traversal, Err(CmsError::Validation(_))));

        assert!(backend.paths().await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_is_storage_write_error() {
        let backend = FlakyBackend {
            inner: MemoryBlobBackend::new("https://store"),
            puts_allowed: 0,
            puts: AtomicUsize::new(0),
        };
        let store = BlobStore::with_backend(memory_config(), Arc::new(backend));

        let err = store
            .upload(BlobUpload::new("a.png", vec![1]), "hero")
            .await
            .unwrap_err();
        assert!(matches!(err, CmsError::StorageWrite(_)));
    }

    #[tokio::test]
    async fn test_upload_many_cleans_up_on_partial_failure() {
        let (store, backend) = create_test_store();

        let locators = store
            .upload_many(
                vec![
                    BlobUpload::new("a.jpg", vec![1]),
                    BlobUpload::new("a.jpg", vec![2]),
                    BlobUpload::new("b.webp", vec![3]),
                ],
                "gallery",
            )
            .await
            .unwrap();
        assert_eq!(locators.len(), 3);
        assert_eq!(backend.paths().await.len(), 3);

        let result = store
            .upload_many(
                vec![
                    BlobUpload::new("ok.png", vec![1]),
                    BlobUpload::new("bad.bin", vec![2]),
                ],
                "gallery",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(backend.paths().await.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_by_locator_outcomes() {
        let (store, _backend) = create_test_store();

        let locator = store
            .upload(BlobUpload::new("cover.jpg", vec![9]), "news")
            .await
            .unwrap();
        let path = locator.storage_path().unwrap();

        assert_eq!(
            store.delete_by_locator(&locator).await,
            BlobDeleteOutcome::Deleted { path: path.clone() }
        );
        assert_eq!(
            store.delete_by_locator(&locator).await,
            BlobDeleteOutcome::AlreadyAbsent { path }
        );

        let skipped = store.delete_by_locator(&BlobLocator::new("")).await;
        assert_eq!(skipped, BlobDeleteOutcome::Skipped { reason: LocatorError::Empty });
        assert!(!skipped.attempted());

        let malformed = store.delete_by_locator(&BlobLocator::new("not a url")).await;
        assert!(!malformed.attempted());
    }

    #[tokio::test]
    async fn test_delete_ignores_locators_from_other_origins() {
        let (store, backend) = create_test_store();

        let locator = store
            .upload(BlobUpload::new("a.png", vec![1]), "gallery")
            .await
            .unwrap();
        let path = locator.storage_path().unwrap();
        let foreign = BlobLocator::new(format!(
            "https://evil.example.com/anything/o/{}?alt=media",
            urlencoding::encode(&path)
        ));

        let outcome = store.delete_by_locator(&foreign).await;
        assert_eq!(outcome, BlobDeleteOutcome::Skipped { reason: LocatorError::ForeignOrigin });
        assert!(!outcome.attempted());
        assert_eq!(backend.paths().await, vec![path]);
        assert!(store.get(&foreign).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_failures_are_swallowed() {
        let backend = FlakyBackend {
            inner: MemoryBlobBackend::new("https://store"),
            puts_allowed: usize::MAX,
            puts: AtomicUsize::new(0),
        };
        let store = BlobStore::with_backend(
            BlobStorageConfig {
                strict_cleanup: true,
                ..memory_config()
            },
            Arc::new(backend),
        );

        let outcome = store
            .delete_by_locator(&BlobLocator::new("https://store/o/gallery%2F1.png"))
            .await;
        assert!(outcome.attempted());
        assert!(!outcome.is_clean());
        assert!(matches!(outcome, BlobDeleteOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_disk_backed_store() {
        let dir = tempdir().unwrap();
        let store = BlobStore::new(BlobStorageConfig {
            backend: BlobBackendType::Disk {
                location: dir.path().to_path_buf(),
            },
            public_base_url: "https://cdn.example.com".to_string(),
            ..Default::default()
        })
        .unwrap();

        let locator = store
            .upload(BlobUpload::new("intro.mp4", vec![0, 1, 2]), "hero")
            .await
            .unwrap();
        assert!(store.delete_by_locator(&locator).await.is_clean());
        assert_eq!(store.get(&locator).await.unwrap(), None);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic 1.jpg"), "pic_1.jpg");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("صورة.jpg"), "صورة.jpg");
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.JPG"), Some("image/jpeg"));
        assert_eq!(guess_mime_type("clip.mov"), Some("video/quicktime"));
        assert_eq!(guess_mime_type("notes.txt"), None);
    }
}
