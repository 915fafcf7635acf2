/// Site settings models
use crate::{blob_store::BlobLocator, content::LocalizedText};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Site-wide settings, stored as a single document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default)]
    pub site_name: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<BlobLocator>,
    #[serde(default)]
    pub phones: Vec<ContactEntry>,
    #[serde(default)]
    pub emails: Vec<ContactEntry>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub social_links: SocialLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SiteSettings {
    pub fn contacts(&self, kind: ContactKind) -> &[ContactEntry] {
        match kind {
            ContactKind::Phone => &self.phones,
            ContactKind::Email => &self.emails,
        }
    }

    pub(crate) fn contacts_mut(&mut self, kind: ContactKind) -> &mut Vec<ContactEntry> {
        match kind {
            ContactKind::Phone => &mut self.phones,
            ContactKind::Email => &mut self.emails,
        }
    }
}

/// Which contact list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Phone,
    Email,
}

/// A phone number or email address with a display label
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactEntry {
    pub id: String,
    #[serde(default)]
    pub label: LocalizedText,
    #[serde(default)]
    pub value: String,
}

/// Branch or showroom location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    #[serde(default)]
    pub name: LocalizedText,
    #[serde(default)]
    pub address: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_url: Option<String>,
}

/// Social profile links; unset networks are omitted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiktok: Option<String>,
}
