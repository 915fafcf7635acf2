/// In-memory document store
use crate::{
    db::{
        compare_values, field_at, merge_fields, now_timestamp, resolve_sentinels, Direction,
        Document, DocumentStore, Fields, OrderBy, WriteMode,
    },
    error::{CmsError, CmsResult},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

type Collection = BTreeMap<String, Fields>;

/// Document store held entirely in process memory
///
/// Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> CmsResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, mut fields: Fields, mode: WriteMode) -> CmsResult<()> {
        resolve_sentinels(&mut fields, &now_timestamp());

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        match (mode, docs.get_mut(id)) {
            (WriteMode::Merge, Some(existing)) => merge_fields(existing, fields),
            _ => {
                docs.insert(id.to_string(), fields);
            }
        }

        Ok(())
    }

    async fn add(&self, collection: &str, mut fields: Fields) -> CmsResult<String> {
        resolve_sentinels(&mut fields, &now_timestamp());
        let id = uuid::Uuid::new_v4().simple().to_string();

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, mut fields: Fields) -> CmsResult<()> {
        resolve_sentinels(&mut fields, &now_timestamp());

        let mut collections = self.collections.write().await;
        let existing = collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| CmsError::NotFound(format!("Document {}/{} not found", collection, id)))?;

        for (key, value) in fields {
            existing.insert(key, value);
        }

        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> CmsResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str, order_by: Option<&OrderBy>) -> CmsResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(order) = order_by {
            docs.retain(|doc| field_at(&doc.fields, &order.field).is_some());
            docs.sort_by(|a, b| {
                // Both present after the retain above
                let ordering = match (field_at(&a.fields, &order.field), field_at(&b.fields, &order.field)) {
                    (Some(x), Some(y)) => compare_values(x, y),
                    _ => std::cmp::Ordering::Equal,
                };
                match order.direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        Ok(docs)
    }
}
