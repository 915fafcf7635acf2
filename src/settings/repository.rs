/// Settings repository
///
/// Reads degrade to defaults. Mutations read the stored document strictly
/// first, so a failed read never turns into defaults written over real
/// settings.
use crate::{
    blob_store::{BlobLocator, BlobStore, BlobUpload},
    content::LocalizedText,
    db::{self, DocumentStore, WriteMode},
    error::{CmsError, CmsResult},
    ids,
    settings::{ContactEntry, ContactKind, Location, SiteSettings, SETTINGS_COLLECTION, SETTINGS_ID},
};
use std::sync::Arc;

/// Upload folder for the site logo
pub const SETTINGS_FOLDER: &str = "settings";

#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn DocumentStore>,
    blobs: Arc<BlobStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn DocumentStore>, blobs: Arc<BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Current settings, or defaults when absent or unreadable
    pub async fn get(&self) -> SiteSettings {
        match self.get_strict().await {
            Ok(Some(settings)) => settings,
            Ok(None) => SiteSettings::default(),
            Err(e) => {
                tracing::error!("Failed to read site settings: {}", e);
                SiteSettings::default()
            }
        }
    }

    /// Stored settings, `None` when the document does not exist yet
    pub async fn get_strict(&self) -> CmsResult<Option<SiteSettings>> {
        match self.store.get(SETTINGS_COLLECTION, SETTINGS_ID).await? {
            Some(document) => Ok(Some(db::decode_record(document)?)),
            None => Ok(None),
        }
    }

    /// Replace the settings document
    pub async fn save(&self, settings: &SiteSettings) -> CmsResult<()> {
        let mut fields = db::encode_record(settings)?;
        fields.insert("updatedAt".to_string(), db::server_timestamp());
        self.store
            .set(SETTINGS_COLLECTION, SETTINGS_ID, fields, WriteMode::Replace)
            .await?;
        tracing::info!("Saved site settings");
        Ok(())
    }

    pub async fn add_contact_entry(
        &self,
        kind: ContactKind,
        label: LocalizedText,
        value: impl Into<String>,
    ) -> CmsResult<String> {
        let mut settings = self.load().await?;
        let id = ids::new_id();
        settings.contacts_mut(kind).push(ContactEntry {
            id: id.clone(),
            label,
            value: value.into(),
        });
        self.save(&settings).await?;
        Ok(id)
    }

    pub async fn remove_contact_entry(&self, kind: ContactKind, id: &str) -> CmsResult<()> {
        let mut settings = self.load().await?;
        let entries = settings.contacts_mut(kind);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Err(CmsError::NotFound(format!("Contact entry {} not found", id)));
        }
        self.save(&settings).await
    }

    pub async fn add_location(
        &self,
        name: LocalizedText,
        address: LocalizedText,
        map_url: Option<String>,
    ) -> CmsResult<String> {
        let mut settings = self.load().await?;
        let id = ids::new_id();
        settings.locations.push(Location {
            id: id.clone(),
            name,
            address,
            map_url,
        });
        self.save(&settings).await?;
        Ok(id)
    }

    pub async fn remove_location(&self, id: &str) -> CmsResult<()> {
        let mut settings = self.load().await?;
        let before = settings.locations.len();
        settings.locations.retain(|l| l.id != id);
        if settings.locations.len() == before {
            return Err(CmsError::NotFound(format!("Location {} not found", id)));
        }
        self.save(&settings).await
    }

    /// Upload a new logo, point the settings at it, then release the old one
    pub async fn replace_logo(&self, file: BlobUpload) -> CmsResult<BlobLocator> {
        let locator = self.blobs.upload(file, SETTINGS_FOLDER).await?;

        let mut settings = self.load().await?;
        let previous = settings.logo_url.replace(locator.clone());
        self.save(&settings).await?;

        if let Some(previous) = previous {
            self.blobs.delete_by_locator(&previous).await;
        }
        Ok(locator)
    }

    async fn load(&self) -> CmsResult<SiteSettings> {
        Ok(self.get_strict().await?.unwrap_or_default())
    }
}
