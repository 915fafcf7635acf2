/// Gallery tree models
///
/// A `Country` document embeds its albums, which embed their images. Only
/// the country has storage of its own.
use crate::{blob_store::BlobLocator, content::LocalizedText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root document of the gallery tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub albums: Vec<Album>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Country {
    pub fn album(&self, album_id: &str) -> Option<&Album> {
        self.albums.iter().find(|a| a.id == album_id)
    }

    pub(crate) fn album_mut(&mut self, album_id: &str) -> Option<&mut Album> {
        self.albums.iter_mut().find(|a| a.id == album_id)
    }

    /// Every image locator in every album, in tree order
    pub fn blob_locators(&self) -> Vec<&BlobLocator> {
        self.albums.iter().flat_map(|a| a.blob_locators()).collect()
    }
}

/// Album embedded in a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub images: Vec<GalleryImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Album {
    pub fn blob_locators(&self) -> Vec<&BlobLocator> {
        self.images.iter().map(|i| &i.image_url).collect()
    }
}

/// Image embedded in an album; addressed by its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    #[serde(default)]
    pub image_url: BlobLocator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl GalleryImage {
    pub fn new(image_url: BlobLocator) -> Self {
        Self {
            image_url,
            created_at: Some(Utc::now()),
        }
    }
}

/// Album fields supplied by an editor
///
/// Without an `id` a new album is created. `images` replaces the album's
/// image list when present and leaves it untouched when `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlbumDraft {
    pub id: Option<String>,
    pub name: LocalizedText,
    pub images: Option<Vec<GalleryImage>>,
}

impl AlbumDraft {
    pub fn new(name: LocalizedText) -> Self {
        Self {
            id: None,
            name,
            images: None,
        }
    }

    pub fn editing(id: impl Into<String>, name: LocalizedText) -> Self {
        Self {
            id: Some(id.into()),
            name,
            images: None,
        }
    }

    pub fn with_images(mut self, images: Vec<GalleryImage>) -> Self {
        self.images = Some(images);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_country_locators_flatten_albums() {
        let now = Utc::now();
        let album = |id: &str, urls: &[&str]| Album {
            id: id.to_string(),
            name: LocalizedText::default(),
            images: urls
                .iter()
                .map(|u| GalleryImage {
                    image_url: BlobLocator::new(*u),
                    created_at: Some(now),
                })
                .collect(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        let country = Country {
            id: "c1".to_string(),
            albums: vec![album("a", &["u1", "u2"]), album("b", &["u3"])],
            ..Default::default()
        };

        let locators: Vec<&str> = country.blob_locators().iter().map(|l| l.as_str()).collect();
        assert_eq!(locators, vec!["u1", "u2", "u3"]);
        assert!(country.album("b").is_some());
        assert!(country.album("z").is_none());
    }

    #[test]
    fn test_stored_shape() {
        let image = GalleryImage::new(BlobLocator::new("https://store/o/gallery%2F1.png?alt=media"));
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(value["imageUrl"], json!("https://store/o/gallery%2F1.png?alt=media"));
        assert!(value["createdAt"].is_string());
    }
}
