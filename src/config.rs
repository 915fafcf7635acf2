/// Configuration management for the showcase CMS
use crate::{
    blob_store::{BlobBackendType, BlobStorageConfig, DEFAULT_ALLOWED_TYPES},
    error::{CmsError, CmsResult},
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    pub storage: StorageConfig,
    pub blobs: BlobsConfig,
    pub seed: SeedConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: DatabaseConfig,
    pub blobstore: BlobstoreConfig,
    /// Base of the retrievable URLs handed out for blobs
    pub public_blob_url: String,
}

/// Document database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DatabaseConfig {
    Sqlite { path: PathBuf, max_connections: u32 },
    Memory,
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BlobstoreConfig {
    Disk { location: PathBuf },
    Memory,
}

/// Upload and cleanup policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobsConfig {
    pub max_upload_size: usize,
    pub allowed_mime_types: Vec<String>,
    /// Log failed blob deletes as errors instead of warnings
    pub strict_cleanup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub on_start: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl CmsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> CmsResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> CmsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_directory: PathBuf = var("CMS_DATA_DIRECTORY", "./data").into();

        let database = match var("CMS_DATABASE", "sqlite").to_ascii_lowercase().as_str() {
            "sqlite" => DatabaseConfig::Sqlite {
                path: lookup("CMS_DATABASE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_directory.join("content.sqlite")),
                max_connections: var("CMS_DATABASE_MAX_CONNECTIONS", "5")
                    .parse()
                    .map_err(|_| CmsError::Config("Invalid database connection count".to_string()))?,
            },
            "memory" => DatabaseConfig::Memory,
            other => {
                return Err(CmsError::Config(format!(
                    "Unknown document database backend: {}",
                    other
                )))
            }
        };

        let blobstore = match var("CMS_BLOBSTORE", "disk").to_ascii_lowercase().as_str() {
            "disk" => BlobstoreConfig::Disk {
                location: lookup("CMS_BLOBSTORE_DISK_LOCATION")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| data_directory.join("blobs")),
            },
            "memory" => BlobstoreConfig::Memory,
            other => {
                return Err(CmsError::Config(format!(
                    "Unknown blob store backend: {}",
                    other
                )))
            }
        };

        let public_blob_url = var("CMS_BLOB_PUBLIC_URL", "http://localhost:8080/blobs");

        let max_upload_size = var("CMS_BLOB_UPLOAD_LIMIT", "26214400")
            .parse()
            .map_err(|_| CmsError::Config("Invalid blob upload limit".to_string()))?;
        let allowed_mime_types = match lookup("CMS_BLOB_ALLOWED_TYPES") {
            Some(types) => types
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_TYPES.iter().map(|s| s.to_string()).collect(),
        };
        let strict_cleanup = var("CMS_BLOB_STRICT_CLEANUP", "false")
            .parse()
            .unwrap_or(false);

        let seed_on_start = var("CMS_SEED_ON_START", "false").parse().unwrap_or(false);

        let log_level = lookup("RUST_LOG")
            .or_else(|| lookup("CMS_LOG_LEVEL"))
            .unwrap_or_else(|| "showcase_cms=info".to_string());
        let log_json = var("CMS_LOG_FORMAT", "pretty").eq_ignore_ascii_case("json");

        Ok(CmsConfig {
            storage: StorageConfig {
                data_directory,
                database,
                blobstore,
                public_blob_url,
            },
            blobs: BlobsConfig {
                max_upload_size,
                allowed_mime_types,
                strict_cleanup,
            },
            seed: SeedConfig {
                on_start: seed_on_start,
            },
            logging: LoggingConfig {
                level: log_level,
                json: log_json,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> CmsResult<()> {
        if self.storage.public_blob_url.trim().is_empty() {
            return Err(CmsError::Config("Public blob URL cannot be empty".to_string()));
        }

        if self.blobs.max_upload_size == 0 {
            return Err(CmsError::Config("Blob upload limit must be positive".to_string()));
        }

        if self.blobs.allowed_mime_types.is_empty() {
            return Err(CmsError::Config("At least one MIME type must be allowed".to_string()));
        }

        if let DatabaseConfig::Sqlite { max_connections, .. } = &self.storage.database {
            if *max_connections == 0 {
                return Err(CmsError::Config(
                    "Database connection count must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Blob store settings derived from this configuration
    pub fn blob_storage_config(&self) -> BlobStorageConfig {
        let backend = match &self.storage.blobstore {
            BlobstoreConfig::Disk { location } => BlobBackendType::Disk {
                location: location.clone(),
            },
            BlobstoreConfig::Memory => BlobBackendType::Memory,
        };

        BlobStorageConfig {
            backend,
            public_base_url: self.storage.public_blob_url.clone(),
            max_blob_size: self.blobs.max_upload_size,
            allowed_mime_types: self.blobs.allowed_mime_types.clone(),
            strict_cleanup: self.blobs.strict_cleanup,
        }
    }
}
