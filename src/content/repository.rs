/// Document repository for flat content collections
///
/// One generic repository serves every flat collection. Timestamps are
/// server-assigned: `createdAt` on first save, `updatedAt` on every save.
/// Deleting a record also removes its blobs, best-effort and before the
/// document itself goes away.
use crate::{
    blob_store::BlobStore,
    content::{ContentRecord, OrderedRecord, SlugRecord},
    db::{self, DocumentStore, Fields, OrderBy, WriteMode},
    error::{CmsError, CmsResult},
};
use std::marker::PhantomData;
use std::sync::Arc;

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

/// Repository over the collection of `T`
pub struct DocumentRepository<T> {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<BlobStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for DocumentRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            blobs: self.blobs.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: ContentRecord> DocumentRepository<T> {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<BlobStore>) -> Self {
        Self {
            store,
            blobs,
            _record: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// List records for display
    ///
    /// Read failures degrade to an empty list and are logged. Documents that
    /// fail to decode are skipped.
    pub async fn list(&self, order_by: Option<OrderBy>) -> Vec<T> {
        match self.list_strict(order_by.as_ref()).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to list {}: {}", T::COLLECTION, e);
                Vec::new()
            }
        }
    }

    /// List records, surfacing read failures
    pub async fn list_strict(&self, order_by: Option<&OrderBy>) -> CmsResult<Vec<T>> {
        let documents = self.store.list(T::COLLECTION, order_by).await?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document.id.clone();
            match db::decode_record::<T>(document) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Skipping malformed {}/{}: {}", T::COLLECTION, id, e),
            }
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> CmsResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(document) => Ok(Some(db::decode_record(document)?)),
            None => Ok(None),
        }
    }

    /// Create or replace a record, returning its identifier
    ///
    /// Without an id the record is inserted under a fresh identifier with
    /// both timestamps set. With an id the document is fully replaced and only
    /// `updatedAt` is refreshed; `createdAt` survives only if the record
    /// carries it.
    pub async fn save(&self, record: &T) -> CmsResult<String> {
        let mut fields = db::encode_record(record)?;
        fields.insert(UPDATED_AT.to_string(), db::server_timestamp());

        match record.id() {
            Some(id) => {
                self.store
                    .set(T::COLLECTION, id, fields, WriteMode::Replace)
                    .await?;
                tracing::info!("Saved {}/{}", T::COLLECTION, id);
                Ok(id.to_string())
            }
            None => {
                fields.insert(CREATED_AT.to_string(), db::server_timestamp());
                let id = self.store.add(T::COLLECTION, fields).await?;
                tracing::info!("Created {}/{}", T::COLLECTION, id);
                Ok(id)
            }
        }
    }

    /// Overwrite selected top-level fields of an existing record
    pub async fn update_fields(&self, id: &str, mut fields: Fields) -> CmsResult<()> {
        fields.insert(UPDATED_AT.to_string(), db::server_timestamp());
        self.store.update(T::COLLECTION, id, fields).await?;
        tracing::info!("Updated {}/{}", T::COLLECTION, id);
        Ok(())
    }

    /// Delete a record and the blobs it owns
    ///
    /// Absent records are a no-op. Blob cleanup never blocks the document
    /// delete.
    pub async fn delete(&self, id: &str) -> CmsResult<()> {
        let Some(document) = self.store.get(T::COLLECTION, id).await? else {
            tracing::debug!("Delete of missing {}/{} ignored", T::COLLECTION, id);
            return Ok(());
        };

        match db::decode_record::<T>(document) {
            Ok(record) => {
                self.blobs.delete_all(record.blob_locators()).await;
            }
            Err(e) => tracing::warn!(
                "Cannot read blobs of {}/{}, deleting document only: {}",
                T::COLLECTION,
                id,
                e
            ),
        }

        self.store.delete(T::COLLECTION, id).await?;
        tracing::info!("Deleted {}/{}", T::COLLECTION, id);
        Ok(())
    }
}

impl<T: OrderedRecord> DocumentRepository<T> {
    /// Position after the current last record
    pub async fn next_order(&self) -> CmsResult<i64> {
        let records = self.list_strict(None).await?;
        Ok(records.iter().map(|r| r.order()).max().unwrap_or(0) + 1)
    }

    /// Insert a record at the end of the display order
    pub async fn create_ordered(&self, mut record: T) -> CmsResult<String> {
        if record.id().is_some() {
            return Err(CmsError::Validation(format!(
                "New {} record must not carry an id",
                T::COLLECTION
            )));
        }
        record.set_order(self.next_order().await?);
        self.save(&record).await
    }

    /// List in display order
    pub async fn list_ordered(&self) -> Vec<T> {
        self.list(Some(OrderBy::asc(T::ORDER_FIELD))).await
    }
}

impl<T: SlugRecord> DocumentRepository<T> {
    /// Save under the record's slug
    ///
    /// An existing document is merged into, keeping fields the record omits.
    /// A new document gets both timestamps.
    pub async fn save_by_slug(&self, record: &T) -> CmsResult<String> {
        let slug = record.slug().trim();
        if slug.is_empty() || slug.contains('/') {
            return Err(CmsError::Validation(format!(
                "Invalid {} slug: {:?}",
                T::COLLECTION,
                record.slug()
            )));
        }

        let mut fields = db::encode_record(record)?;
        fields.insert(UPDATED_AT.to_string(), db::server_timestamp());

        let exists = self.store.get(T::COLLECTION, slug).await?.is_some();
        let mode = if exists {
            WriteMode::Merge
        } else {
            fields.insert(CREATED_AT.to_string(), db::server_timestamp());
            WriteMode::Replace
        };

        self.store.set(T::COLLECTION, slug, fields, mode).await?;
        tracing::info!("Saved {}/{}", T::COLLECTION, slug);
        Ok(slug.to_string())
    }
}
