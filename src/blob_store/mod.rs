/// Blob Storage System
///
/// Holds the images and videos referenced by content documents. Documents
/// only keep retrievable URLs (locators); the storage path is recovered from
/// the locator when a blob has to be removed.

pub mod disk;
pub mod locator;
pub mod memory;
pub mod store;

pub use locator::{BlobLocator, LocatorError};
pub use disk::DiskBlobBackend;
pub use memory::MemoryBlobBackend;
pub use store::{BlobDeleteOutcome, BlobStore, BlobUpload};

use crate::error::CmsResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Blob storage backend trait
///
/// Implementations handle the actual storage and retrieval of blob data,
/// addressed by slash-separated storage paths.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Store a blob under `path`, replacing any existing object
    async fn put(&self, path: &str, data: Vec<u8>, mime_type: &str) -> CmsResult<()>;

    /// Retrieve a blob by path
    async fn get(&self, path: &str) -> CmsResult<Option<Vec<u8>>>;

    /// Delete a blob; fails with `NotFound` if the object is absent
    async fn delete(&self, path: &str) -> CmsResult<()>;

    /// Check if a blob exists
    async fn exists(&self, path: &str) -> CmsResult<bool>;

    /// Publicly retrievable URL for a storage path
    fn retrievable_url(&self, path: &str) -> String;
}

/// Configuration for blob storage
#[derive(Debug, Clone)]
pub struct BlobStorageConfig {
    /// Backend type
    pub backend: BlobBackendType,

    /// Base of retrievable URLs (`<base>/o/<encoded path>?alt=media`)
    pub public_base_url: String,

    /// Maximum blob size in bytes (default: 25MB)
    pub max_blob_size: usize,

    /// MIME types accepted by `upload`
    pub allowed_mime_types: Vec<String>,

    /// Log cleanup transport failures at error level instead of warn
    pub strict_cleanup: bool,
}

/// MIME types accepted when no explicit list is configured
pub const DEFAULT_ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "video/mp4",
    "video/quicktime",
    "video/webm",
];

impl Default for BlobStorageConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackendType::Disk {
                location: PathBuf::from("./data/blobs"),
            },
            public_base_url: "http://localhost:8080/blobs".to_string(),
            max_blob_size: 25 * 1024 * 1024, // 25MB
            allowed_mime_types: DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
            strict_cleanup: false,
        }
    }
}

/// Backend types for blob storage
#[derive(Debug, Clone)]
pub enum BlobBackendType {
    /// Store blobs on local disk
    Disk { location: PathBuf },

    /// Keep blobs in process memory
    Memory,
}
