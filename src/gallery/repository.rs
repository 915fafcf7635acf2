/// Gallery repository
///
/// Every nested mutation is a whole-document read-modify-write of one
/// country: load the root, locate the album (by id) or image (by position),
/// mutate in memory, release blobs, then overwrite the root. Nothing guards
/// the window between load and write; concurrent edits of the same country
/// are last-writer-wins on the whole document.
use crate::{
    blob_store::{BlobLocator, BlobStore, BlobUpload},
    content::LocalizedText,
    db::{self, DocumentStore, Fields, OrderBy, WriteMode},
    error::{CmsError, CmsResult},
    gallery::{Album, AlbumDraft, Country, GalleryImage, COUNTRIES_COLLECTION},
    ids,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;

/// Upload folder for gallery images
pub const GALLERY_FOLDER: &str = "gallery";

/// Repository for the Country → Album → Image tree
#[derive(Clone)]
pub struct GalleryRepository {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<BlobStore>,
}

impl GalleryRepository {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Countries ordered by English name; read failures degrade to empty
    pub async fn list_countries(&self) -> Vec<Country> {
        match self.list_countries_strict().await {
            Ok(countries) => countries,
            Err(e) => {
                tracing::error!("Failed to list gallery countries: {}", e);
                Vec::new()
            }
        }
    }

    /// Countries ordered by English name, surfacing read failures
    pub async fn list_countries_strict(&self) -> CmsResult<Vec<Country>> {
        let order_by = OrderBy::asc("name.en");
        let documents = self.store.list(COUNTRIES_COLLECTION, Some(&order_by)).await?;

        let mut countries = Vec::with_capacity(documents.len());
        for document in documents {
            let id = document.id.clone();
            match db::decode_record::<Country>(document) {
                Ok(country) => countries.push(country),
                Err(e) => tracing::warn!("Skipping malformed country {}: {}", id, e),
            }
        }
        Ok(countries)
    }

    pub async fn get_country(&self, id: &str) -> CmsResult<Option<Country>> {
        match self.store.get(COUNTRIES_COLLECTION, id).await? {
            Some(document) => Ok(Some(db::decode_record(document)?)),
            None => Ok(None),
        }
    }

    /// Create or rename a country, returning its id
    ///
    /// A new country is written with no albums. Renaming touches only the
    /// name and `updatedAt`, leaving the embedded albums alone.
    pub async fn save_country(&self, id: Option<&str>, name: LocalizedText) -> CmsResult<String> {
        if let Some(id) = id {
            if self.store.get(COUNTRIES_COLLECTION, id).await?.is_some() {
                let mut fields = Fields::new();
                fields.insert("name".to_string(), serde_json::to_value(&name)?);
                fields.insert("updatedAt".to_string(), db::server_timestamp());
                self.store.update(COUNTRIES_COLLECTION, id, fields).await?;
                tracing::info!("Renamed gallery country {}", id);
                return Ok(id.to_string());
            }
        }

        let mut fields = Fields::new();
        fields.insert("name".to_string(), serde_json::to_value(&name)?);
        fields.insert("albums".to_string(), Value::Array(Vec::new()));
        fields.insert("createdAt".to_string(), db::server_timestamp());
        fields.insert("updatedAt".to_string(), db::server_timestamp());

        let id = match id {
            Some(id) => {
                self.store
                    .set(COUNTRIES_COLLECTION, id, fields, WriteMode::Replace)
                    .await?;
                id.to_string()
            }
            None => self.store.add(COUNTRIES_COLLECTION, fields).await?,
        };
        tracing::info!("Created gallery country {}", id);
        Ok(id)
    }

    /// Delete a country with every album and image it holds
    ///
    /// Blob deletes are issued for every image first; the document delete
    /// happens regardless of their outcome. An absent country is a no-op.
    pub async fn delete_country(&self, id: &str) -> CmsResult<()> {
        let Some(document) = self.store.get(COUNTRIES_COLLECTION, id).await? else {
            tracing::debug!("Delete of missing gallery country {} ignored", id);
            return Ok(());
        };

        let locators = match db::decode_record::<Country>(document.clone()) {
            Ok(country) => country.blob_locators().into_iter().cloned().collect(),
            Err(e) => {
                tracing::warn!(
                    "Cannot read gallery country {}, releasing raw image fields: {}",
                    id,
                    e
                );
                raw_image_locators(&document.fields)
            }
        };

        let outcomes = self.blobs.delete_all(locators.iter()).await;
        let failed = outcomes.iter().filter(|o| o.attempted() && !o.is_clean()).count();
        if failed > 0 {
            tracing::warn!("{} blob(s) of country {} could not be deleted", failed, id);
        }

        self.store.delete(COUNTRIES_COLLECTION, id).await?;
        tracing::info!("Deleted gallery country {} ({} blobs)", id, outcomes.len());
        Ok(())
    }

    /// Create or edit an album, returning its id
    ///
    /// New albums get a fresh id unique within the country. Edits keep the
    /// album's `createdAt`; when the draft carries a replacement image list,
    /// blobs of images no longer listed are released.
    pub async fn save_album(&self, country_id: &str, draft: AlbumDraft) -> CmsResult<String> {
        let mut country = self.load_country(country_id).await?;
        let now = Utc::now();

        let album_id = match draft.id {
            Some(album_id) => {
                let album = country
                    .album_mut(&album_id)
                    .ok_or_else(|| album_not_found(country_id, &album_id))?;

                album.name = draft.name;
                if let Some(images) = draft.images {
                    let dropped: Vec<BlobLocator> = album
                        .images
                        .iter()
                        .filter(|old| !images.iter().any(|new| new.image_url == old.image_url))
                        .map(|old| old.image_url.clone())
                        .collect();
                    self.blobs.delete_all(dropped.iter()).await;
                    album.images = images;
                }
                album.updated_at = Some(now);
                album_id
            }
            None => {
                let album_id = unique_album_id(&country);
                country.albums.push(Album {
                    id: album_id.clone(),
                    name: draft.name,
                    images: draft.images.unwrap_or_default(),
                    created_at: Some(now),
                    updated_at: Some(now),
                });
                album_id
            }
        };

        self.write_country(&country).await?;
        tracing::info!("Saved album {} of country {}", album_id, country_id);
        Ok(album_id)
    }

    /// Remove an album and release its image blobs
    pub async fn delete_album(&self, country_id: &str, album_id: &str) -> CmsResult<()> {
        let mut country = self.load_country(country_id).await?;
        let position = country
            .albums
            .iter()
            .position(|a| a.id == album_id)
            .ok_or_else(|| album_not_found(country_id, album_id))?;

        self.blobs
            .delete_all(country.albums[position].blob_locators())
            .await;
        country.albums.remove(position);

        self.write_country(&country).await?;
        tracing::info!("Deleted album {} of country {}", album_id, country_id);
        Ok(())
    }

    /// Append an already uploaded image to an album
    pub async fn add_image_to_album(
        &self,
        country_id: &str,
        album_id: &str,
        image_url: BlobLocator,
    ) -> CmsResult<()> {
        let mut country = self.load_country(country_id).await?;
        let album = country
            .album_mut(album_id)
            .ok_or_else(|| album_not_found(country_id, album_id))?;

        album.images.push(GalleryImage::new(image_url));
        album.updated_at = Some(Utc::now());

        self.write_country(&country).await?;
        tracing::info!("Added image to album {} of country {}", album_id, country_id);
        Ok(())
    }

    /// Upload files concurrently and append them to an album in one write
    ///
    /// The album is checked before anything is uploaded. If any upload fails
    /// no document write happens.
    pub async fn upload_images_to_album(
        &self,
        country_id: &str,
        album_id: &str,
        files: Vec<BlobUpload>,
    ) -> CmsResult<Vec<BlobLocator>> {
        let mut country = self.load_country(country_id).await?;
        if country.album(album_id).is_none() {
            return Err(album_not_found(country_id, album_id));
        }

        let locators = self.blobs.upload_many(files, GALLERY_FOLDER).await?;

        let album = country
            .album_mut(album_id)
            .ok_or_else(|| album_not_found(country_id, album_id))?;
        album
            .images
            .extend(locators.iter().cloned().map(GalleryImage::new));
        album.updated_at = Some(Utc::now());

        self.write_country(&country).await?;
        tracing::info!(
            "Uploaded {} image(s) to album {} of country {}",
            locators.len(),
            album_id,
            country_id
        );
        Ok(locators)
    }

    /// Remove the image at `index`, releasing its blob first
    pub async fn delete_image_from_album(
        &self,
        country_id: &str,
        album_id: &str,
        index: usize,
    ) -> CmsResult<()> {
        let mut country = self.load_country(country_id).await?;
        let album = country
            .album_mut(album_id)
            .ok_or_else(|| album_not_found(country_id, album_id))?;

        let Some(image) = album.images.get(index) else {
            return Err(CmsError::NotFound(format!(
                "Image {} not found in album {} ({} images)",
                index,
                album_id,
                album.images.len()
            )));
        };

        self.blobs.delete_by_locator(&image.image_url).await;
        album.images.remove(index);
        album.updated_at = Some(Utc::now());

        self.write_country(&country).await?;
        tracing::info!("Deleted image {} from album {} of country {}", index, album_id, country_id);
        Ok(())
    }

    async fn load_country(&self, id: &str) -> CmsResult<Country> {
        self.get_country(id)
            .await?
            .ok_or_else(|| CmsError::NotFound(format!("Gallery country {} not found", id)))
    }

    /// Overwrite the whole root document, refreshing its `updatedAt`
    async fn write_country(&self, country: &Country) -> CmsResult<()> {
        let mut fields = db::encode_record(country)?;
        fields.insert("updatedAt".to_string(), db::server_timestamp());
        self.store
            .set(COUNTRIES_COLLECTION, &country.id, fields, WriteMode::Replace)
            .await
    }
}

fn album_not_found(country_id: &str, album_id: &str) -> CmsError {
    CmsError::NotFound(format!("Album {} not found in country {}", album_id, country_id))
}

/// Every `albums[*].images[*].imageUrl` string found in a raw country document
fn raw_image_locators(fields: &Fields) -> Vec<BlobLocator> {
    fields
        .get("albums")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|album| album.get("images").and_then(Value::as_array))
        .flatten()
        .filter_map(|image| image.get("imageUrl").and_then(Value::as_str))
        .map(BlobLocator::new)
        .collect()
}

fn unique_album_id(country: &Country) -> String {
    loop {
        let id = ids::new_id();
        if country.album(&id).is_none() {
            return id;
        }
    }
}
