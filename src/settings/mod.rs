/// Site settings singleton

pub mod models;
pub mod repository;

pub use models::{ContactEntry, ContactKind, Location, SiteSettings, SocialLinks};
pub use repository::{SettingsRepository, SETTINGS_FOLDER};

pub const SETTINGS_COLLECTION: &str = "settings";

/// Identifier of the one settings document
pub const SETTINGS_ID: &str = "site";
