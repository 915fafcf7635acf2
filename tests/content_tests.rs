/// Flat content integration tests
/// Runs the document repository against sqlite and disk-backed blobs
mod common;

use common::{blob_store, InstrumentedStore, RecordingBlobBackend};
use serde_json::{json, Value};
use showcase_cms::{
    blob_store::{BlobBackendType, BlobStorageConfig, BlobStore, BlobUpload},
    config::CmsConfig,
    content::{
        ContactMessage, DocumentRepository, HeroSlide, LocalizedText, NewsArticle, Order,
        OrderItem, OrderStatus,
    },
    db::{DatabaseOptions, Fields, OrderBy, SqliteDocumentStore},
    error::CmsError,
    AppContext,
};
use std::sync::Arc;
use tempfile::tempdir;

async fn create_context(dir: &std::path::Path) -> AppContext {
    let config = CmsConfig::from_lookup(|key| match key {
        "CMS_DATA_DIRECTORY" => Some(dir.join("data").display().to_string()),
        "CMS_BLOB_PUBLIC_URL" => Some("https://cdn.example.com".to_string()),
        _ => None,
    })
    .unwrap();
    AppContext::new(config).await.unwrap()
}

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_hero_slides_keep_display_order() {
    let dir = tempdir().unwrap();
    let ctx = create_context(dir.path()).await;

    for title in ["Spring", "Summer", "Autumn"] {
        ctx.hero_slides
            .create_ordered(HeroSlide {
                title: LocalizedText::en(title),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let titles: Vec<String> = ctx
        .hero_slides
        .list_ordered()
        .await
        .into_iter()
        .map(|s| s.title.en)
        .collect();
    assert_eq!(titles, vec!["Spring", "Summer", "Autumn"]);

    let newest_first: Vec<i64> = ctx
        .hero_slides
        .list(Some(OrderBy::desc("order")))
        .await
        .into_iter()
        .map(|s| s.order)
        .collect();
    assert_eq!(newest_first, vec![3, 2, 1]);
}

#[tokio::test]
async fn test_article_delete_removes_cover_from_disk() {
    let dir = tempdir().unwrap();
    let ctx = create_context(dir.path()).await;

    let cover = ctx
        .blob_store
        .upload(BlobUpload::new("cover.webp", vec![7; 16]), "news")
        .await
        .unwrap();
    assert!(cover.as_str().starts_with("https://cdn.example.com/o/news%2F"));

    let id = ctx
        .news
        .save(&NewsArticle {
            title: LocalizedText::new("Opening", "افتتاح"),
            cover_image_url: Some(cover.clone()),
            published: true,
            ..Default::default()
        })
        .await
        .unwrap();

    let blob_file = cover
        .storage_path()
        .unwrap()
        .split('/')
        .fold(dir.path().join("data").join("blobs"), |acc, s| acc.join(s));
    assert!(blob_file.exists());

    ctx.news.delete(&id).await.unwrap();
    assert!(!blob_file.exists());
    assert!(ctx.news.get(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_status_flags_update_in_place() {
    let dir = tempdir().unwrap();
    let ctx = create_context(dir.path()).await;

    let message_id = ctx
        .messages
        .save(&ContactMessage {
            name: "Mona".to_string(),
            email: "mona@example.com".to_string(),
            message: "Do you deliver on Fridays?".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();
    ctx.messages
        .update_fields(&message_id, fields(json!({ "read": true })))
        .await
        .unwrap();
    let message = ctx.messages.get(&message_id).await.unwrap().unwrap();
    assert!(message.read);
    assert_eq!(message.message, "Do you deliver on Fridays?");

    let order_id = ctx
        .orders
        .save(&Order {
            customer_name: "Omar".to_string(),
            phone: "+971500000000".to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                name: LocalizedText::en("Roses"),
                quantity: 12,
            }],
            ..Default::default()
        })
        .await
        .unwrap();
    ctx.orders
        .update_fields(&order_id, fields(json!({ "status": OrderStatus::Confirmed.as_str() })))
        .await
        .unwrap();
    let order = ctx.orders.get(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.items[0].quantity, 12);
}

#[tokio::test]
async fn test_documents_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("content.sqlite");
    let blobs = Arc::new(
        BlobStore::new(BlobStorageConfig {
            backend: BlobBackendType::Memory,
            public_base_url: "https://store".to_string(),
            ..Default::default()
        })
        .unwrap(),
    );

    let id = {
        let store = Arc::new(SqliteDocumentStore::connect(&path, DatabaseOptions::default()).await.unwrap());
        let slides: DocumentRepository<HeroSlide> = DocumentRepository::new(store, blobs.clone());
        slides
            .create_ordered(HeroSlide {
                title: LocalizedText::en("Persistent"),
                ..Default::default()
            })
            .await
            .unwrap()
    };

    let store = Arc::new(SqliteDocumentStore::connect(&path, DatabaseOptions::default()).await.unwrap());
    let slides: DocumentRepository<HeroSlide> = DocumentRepository::new(store, blobs);
    let slide = slides.get(&id).await.unwrap().unwrap();
    assert_eq!(slide.title.en, "Persistent");
    assert_eq!(slide.order, 1);
    assert!(slide.created_at.is_some());
}

#[tokio::test]
async fn test_failed_delete_reports_persistence_error() {
    let store = Arc::new(InstrumentedStore::new(1));
    let backend = RecordingBlobBackend::new();
    let blobs = blob_store(&backend);
    let news: DocumentRepository<NewsArticle> = DocumentRepository::new(store.clone(), blobs.clone());

    let cover = blobs
        .upload(BlobUpload::new("cover.png", vec![1]), "news")
        .await
        .unwrap();
    let id = news
        .save(&NewsArticle {
            title: LocalizedText::en("Launch"),
            cover_image_url: Some(cover),
            ..Default::default()
        })
        .await
        .unwrap();

    store.set_reject_writes(true);
    let err = news.delete(&id).await.unwrap_err();

    assert!(matches!(err, CmsError::Persistence(_)));
    assert_eq!(backend.deleted_paths().len(), 1);
    assert!(news.get(&id).await.unwrap().is_some());
}
