/// Content - flat, document-per-record collections
///
/// Hero slides, products, gift products, categories, news, orders and contact
/// messages each live in their own collection, one document per record.

pub mod localized;
pub mod models;
pub mod repository;

pub use localized::{Language, LocalizedText};
pub use models::*;
pub use repository::DocumentRepository;

use crate::blob_store::BlobLocator;
use serde::{de::DeserializeOwned, Serialize};

/// A record stored as one document of a fixed collection
pub trait ContentRecord: Serialize + DeserializeOwned + Send + Sync {
    /// Collection the records live in
    const COLLECTION: &'static str;

    /// Document identifier, `None` until the record is first saved
    fn id(&self) -> Option<&str>;

    /// Blobs owned by the record, deleted along with it
    fn blob_locators(&self) -> Vec<&BlobLocator> {
        Vec::new()
    }
}

/// A record with an explicit display position
pub trait OrderedRecord: ContentRecord {
    /// Field holding the position
    const ORDER_FIELD: &'static str = "order";

    fn order(&self) -> i64;

    fn set_order(&mut self, order: i64);
}

/// A record whose slug is its document identifier
pub trait SlugRecord: ContentRecord {
    fn slug(&self) -> &str;
}
