/// Flat content record models
use crate::{
    blob_store::BlobLocator,
    content::{ContentRecord, LocalizedText, OrderedRecord, SlugRecord},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Homepage hero carousel slide
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroSlide {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub subtitle: LocalizedText,
    #[serde(default)]
    pub button_text: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<BlobLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<BlobLocator>,
    #[serde(default)]
    pub order: i64,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Catalog product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    /// Slug of the owning category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default)]
    pub images: Vec<BlobLocator>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Product offered in the gifts section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<BlobLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Product category; the slug doubles as document identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub description: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<BlobLocator>,
    #[serde(default)]
    pub order: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// News / blog article; `content` holds rich-text HTML per language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: LocalizedText,
    #[serde(default)]
    pub summary: LocalizedText,
    #[serde(default)]
    pub content: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<BlobLocator>,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Line item of an order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

/// Order placed through the public site
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Message sent through the contact form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_quantity() -> u32 {
    1
}

macro_rules! content_record {
    ($ty:ty, $collection:expr) => {
        content_record!($ty, $collection, |_record| Vec::new());
    };
    ($ty:ty, $collection:expr, |$record:ident| $locators:expr) => {
        impl ContentRecord for $ty {
            const COLLECTION: &'static str = $collection;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn blob_locators(&self) -> Vec<&BlobLocator> {
                let $record = self;
                $locators
            }
        }
    };
}

content_record!(HeroSlide, "heroSlides", |slide| slide
    .image_url
    .iter()
    .chain(slide.video_url.iter())
    .collect());
content_record!(Product, "products", |product| product.images.iter().collect());
content_record!(GiftProduct, "giftProducts", |gift| gift.image_url.iter().collect());
content_record!(Category, "categories", |category| category.image_url.iter().collect());
content_record!(NewsArticle, "news", |article| article.cover_image_url.iter().collect());
content_record!(Order, "orders");
content_record!(ContactMessage, "messages");

impl OrderedRecord for HeroSlide {
    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl OrderedRecord for Category {
    fn order(&self) -> i64 {
        self.order
    }

    fn set_order(&mut self, order: i64) {
        self.order = order;
    }
}

impl SlugRecord for Category {
    fn slug(&self) -> &str {
        &self.slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_slide_locators() {
        let slide = HeroSlide {
            image_url: Some(BlobLocator::new("https://store/o/hero%2Fa.jpg")),
            video_url: Some(BlobLocator::new("https://store/o/hero%2Fb.mp4")),
            ..Default::default()
        };
        assert_eq!(slide.blob_locators().len(), 2);
        assert!(Order::default().blob_locators().is_empty());
    }

    #[test]
    fn test_camel_case_fields() {
        let slide = HeroSlide {
            button_text: LocalizedText::en("Shop"),
            ..Default::default()
        };
        let value = serde_json::to_value(&slide).unwrap();
        assert_eq!(value["buttonText"]["en"], json!("Shop"));
        assert!(value.get("id").is_none());
        assert!(value.get("createdAt").is_none());
    }

    #[test]
    fn test_sparse_documents_deserialize() {
        let slide: HeroSlide = serde_json::from_value(json!({ "id": "s1" })).unwrap();
        assert!(slide.active);
        assert_eq!(slide.order, 0);

        let order: Order = serde_json::from_value(json!({
            "customerName": "Mona",
            "items": [{ "productId": "p1" }],
            "status": "confirmed"
        }))
        .unwrap();
        assert_eq!(order.items[0].quantity, 1);
        assert_eq!(order.status, OrderStatus::Confirmed);
    }
}
