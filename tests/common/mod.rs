//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use showcase_cms::{
    blob_store::{BlobBackend, BlobBackendType, BlobStorageConfig, BlobStore, MemoryBlobBackend},
    db::{Document, DocumentStore, Fields, MemoryDocumentStore, OrderBy, WriteMode},
    error::{CmsError, CmsResult},
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

pub const BASE_URL: &str = "https://store";

/// Blob backend that records every delete request it receives
#[derive(Clone)]
pub struct RecordingBlobBackend {
    pub inner: MemoryBlobBackend,
    deletes: Arc<Mutex<Vec<String>>>,
}

impl RecordingBlobBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBlobBackend::new(BASE_URL),
            deletes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn deleted_paths(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobBackend for RecordingBlobBackend {
    async fn put(&self, path: &str, data: Vec<u8>, mime_type: &str) -> CmsResult<()> {
        self.inner.put(path, data, mime_type).await
    }

    async fn get(&self, path: &str) -> CmsResult<Option<Vec<u8>>> {
        self.inner.get(path).await
    }

    async fn delete(&self, path: &str) -> CmsResult<()> {
        self.deletes.lock().unwrap().push(path.to_string());
        self.inner.delete(path).await
    }

    async fn exists(&self, path: &str) -> CmsResult<bool> {
        self.inner.exists(path).await
    }

    fn retrievable_url(&self, path: &str) -> String {
        self.inner.retrievable_url(path)
    }
}

pub fn blob_store(backend: &RecordingBlobBackend) -> Arc<BlobStore> {
    let config = BlobStorageConfig {
        backend: BlobBackendType::Memory,
        public_base_url: BASE_URL.to_string(),
        ..Default::default()
    };
    Arc::new(BlobStore::with_backend(config, Arc::new(backend.clone())))
}

/// Document store that counts writes and can hold readers at a barrier
///
/// While gated, every `get` waits until `parties` readers have arrived, so
/// concurrent read-modify-write cycles all observe the same snapshot. With
/// writes rejected, every mutation fails with a persistence error.
pub struct InstrumentedStore {
    pub inner: MemoryDocumentStore,
    writes: AtomicUsize,
    gated: AtomicBool,
    reject_writes: AtomicBool,
    barrier: Barrier,
}

impl InstrumentedStore {
    pub fn new(parties: usize) -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            writes: AtomicUsize::new(0),
            gated: AtomicBool::new(false),
            reject_writes: AtomicBool::new(false),
            barrier: Barrier::new(parties),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn set_gated(&self, gated: bool) {
        self.gated.store(gated, Ordering::SeqCst);
    }

    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn record_write(&self) -> CmsResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(CmsError::Persistence("write rejected".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InstrumentedStore {
    async fn get(&self, collection: &str, id: &str) -> CmsResult<Option<Document>> {
        let document = self.inner.get(collection, id).await?;
        if self.gated.load(Ordering::SeqCst) {
            self.barrier.wait().await;
        }
        Ok(document)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields, mode: WriteMode) -> CmsResult<()> {
        self.record_write()?;
        self.inner.set(collection, id, fields, mode).await
    }

    async fn add(&self, collection: &str, fields: Fields) -> CmsResult<String> {
        self.record_write()?;
        self.inner.add(collection, fields).await
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CmsResult<()> {
        self.record_write()?;
        self.inner.update(collection, id, fields).await
    }

    async fn delete(&self, collection: &str, id: &str) -> CmsResult<()> {
        self.record_write()?;
        self.inner.delete(collection, id).await
    }

    async fn list(&self, collection: &str, order_by: Option<&OrderBy>) -> CmsResult<Vec<Document>> {
        self.inner.list(collection, order_by).await
    }
}
