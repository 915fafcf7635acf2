/// Application context and dependency injection
use crate::{
    blob_store::BlobStore,
    config::{BlobstoreConfig, CmsConfig, DatabaseConfig},
    content::{
        Category, ContactMessage, DocumentRepository, GiftProduct, HeroSlide, NewsArticle, Order,
        Product,
    },
    db::{DatabaseOptions, DocumentStore, MemoryDocumentStore, SqliteDocumentStore},
    error::{CmsError, CmsResult},
    gallery::GalleryRepository,
    seed::Seeder,
    settings::SettingsRepository,
};
use std::sync::Arc;

/// Application context holding the store clients and every repository
///
/// The clients are built once and shared; repositories never reach for a
/// global handle.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<CmsConfig>,
    pub documents: Arc<dyn DocumentStore>,
    pub blob_store: Arc<BlobStore>,
    // Flat collections
    pub hero_slides: DocumentRepository<HeroSlide>,
    pub products: DocumentRepository<Product>,
    pub gift_products: DocumentRepository<GiftProduct>,
    pub categories: DocumentRepository<Category>,
    pub news: DocumentRepository<NewsArticle>,
    pub orders: DocumentRepository<Order>,
    pub messages: DocumentRepository<ContactMessage>,
    // Nested and singleton documents
    pub gallery: GalleryRepository,
    pub settings: SettingsRepository,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: CmsConfig) -> CmsResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let documents: Arc<dyn DocumentStore> = match &config.storage.database {
            DatabaseConfig::Sqlite {
                path,
                max_connections,
            } => {
                let options = DatabaseOptions {
                    max_connections: *max_connections,
                    ..Default::default()
                };
                let store = SqliteDocumentStore::connect(path, options).await?;
                store.ping().await?;
                tracing::info!("Document database: sqlite at {:?}", path);
                Arc::new(store)
            }
            DatabaseConfig::Memory => {
                tracing::info!("Document database: in-memory");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        let blob_store = Arc::new(BlobStore::new(config.blob_storage_config())?);

        Ok(Self::from_parts(config, documents, blob_store))
    }

    /// Assemble a context around already built store clients
    pub fn from_parts(
        config: CmsConfig,
        documents: Arc<dyn DocumentStore>,
        blob_store: Arc<BlobStore>,
    ) -> Self {
        let docs = || documents.clone();
        let blobs = || blob_store.clone();

        Self {
            hero_slides: DocumentRepository::new(docs(), blobs()),
            products: DocumentRepository::new(docs(), blobs()),
            gift_products: DocumentRepository::new(docs(), blobs()),
            categories: DocumentRepository::new(docs(), blobs()),
            news: DocumentRepository::new(docs(), blobs()),
            orders: DocumentRepository::new(docs(), blobs()),
            messages: DocumentRepository::new(docs(), blobs()),
            gallery: GalleryRepository::new(docs(), blobs()),
            settings: SettingsRepository::new(docs(), blobs()),
            config: Arc::new(config),
            documents,
            blob_store,
        }
    }

    /// Seeder wired to this context's repositories
    pub fn seeder(&self) -> Seeder {
        Seeder::new(
            self.documents.clone(),
            self.categories.clone(),
            self.gallery.clone(),
            self.settings.clone(),
        )
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &CmsConfig) -> CmsResult<()> {
        let data_directory = &config.storage.data_directory;
        if !data_directory.exists() {
            tokio::fs::create_dir_all(data_directory).await.map_err(|e| {
                CmsError::Config(format!(
                    "Failed to create directory {:?}: {}",
                    data_directory, e
                ))
            })?;
        }

        // Create blob storage directory if using disk storage
        if let BlobstoreConfig::Disk { location } = &config.storage.blobstore {
            tokio::fs::create_dir_all(location).await?;
        }

        Ok(())
    }
}
