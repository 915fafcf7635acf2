/// Seeding of default catalog data
///
/// Every routine is idempotent: defaults are inserted only into empty
/// collections, and existing documents are upgraded only for fields they
/// lack. A second run over a seeded store writes nothing. All reads are
/// strict, so an unreadable collection aborts seeding instead of looking
/// empty.

pub mod defaults;

use crate::{
    content::{Category, ContentRecord, DocumentRepository, Language, LocalizedText},
    db::{Document, DocumentStore, Fields},
    error::CmsResult,
    gallery::{GalleryRepository, COUNTRIES_COLLECTION},
    settings::{SettingsRepository, SiteSettings},
};
use serde_json::Value;
use std::ops::AddAssign;
use std::sync::Arc;

/// Writes performed by a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub upgraded: usize,
}

impl SeedReport {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.upgraded == 0
    }
}

impl AddAssign for SeedReport {
    fn add_assign(&mut self, other: Self) {
        self.inserted += other.inserted;
        self.upgraded += other.upgraded;
    }
}

pub struct Seeder {
    store: Arc<dyn DocumentStore>,
    categories: DocumentRepository<Category>,
    gallery: GalleryRepository,
    settings: SettingsRepository,
}

impl Seeder {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        categories: DocumentRepository<Category>,
        gallery: GalleryRepository,
        settings: SettingsRepository,
    ) -> Self {
        Self {
            store,
            categories,
            gallery,
            settings,
        }
    }

    pub async fn seed_all(&self) -> CmsResult<SeedReport> {
        let mut report = SeedReport::default();
        report += self.seed_categories().await?;
        report += self.seed_gallery_countries().await?;
        report += self.seed_settings().await?;

        if report.is_noop() {
            tracing::info!("Seeding: nothing to do");
        } else {
            tracing::info!(
                "Seeding complete: {} inserted, {} upgraded",
                report.inserted,
                report.upgraded
            );
        }
        Ok(report)
    }

    /// Insert default categories, or upgrade existing ones missing fields
    pub async fn seed_categories(&self) -> CmsResult<SeedReport> {
        let documents = self.store.list(Category::COLLECTION, None).await?;
        let mut report = SeedReport::default();

        if documents.is_empty() {
            for (position, default) in defaults::DEFAULT_CATEGORIES.iter().enumerate() {
                let category = Category {
                    slug: default.slug.to_string(),
                    name: LocalizedText::new(default.en, default.ar),
                    order: position as i64 + 1,
                    ..Default::default()
                };
                self.categories.save_by_slug(&category).await?;
                report.inserted += 1;
            }
            tracing::info!("Seeded {} default categories", report.inserted);
            return Ok(report);
        }

        let mut next_order = documents
            .iter()
            .filter_map(|d| d.fields.get("order").and_then(Value::as_i64))
            .max()
            .unwrap_or(0)
            + 1;

        for document in &documents {
            let patch = category_upgrade(document, &mut next_order)?;
            if patch.is_empty() {
                continue;
            }
            tracing::info!(
                "Upgrading category {} ({})",
                document.id,
                patch.keys().cloned().collect::<Vec<_>>().join(", ")
            );
            self.categories.update_fields(&document.id, patch).await?;
            report.upgraded += 1;
        }
        Ok(report)
    }

    /// Insert default gallery countries into an empty gallery
    pub async fn seed_gallery_countries(&self) -> CmsResult<SeedReport> {
        let documents = self.store.list(COUNTRIES_COLLECTION, None).await?;
        let mut report = SeedReport::default();
        if !documents.is_empty() {
            return Ok(report);
        }

        for default in defaults::DEFAULT_COUNTRIES {
            self.gallery
                .save_country(Some(default.id), LocalizedText::new(default.en, default.ar))
                .await?;
            report.inserted += 1;
        }
        tracing::info!("Seeded {} gallery countries", report.inserted);
        Ok(report)
    }

    /// Create the settings document when it does not exist
    pub async fn seed_settings(&self) -> CmsResult<SeedReport> {
        if self.settings.get_strict().await?.is_some() {
            return Ok(SeedReport::default());
        }

        let settings = SiteSettings {
            site_name: defaults::default_site_name(),
            ..Default::default()
        };
        self.settings.save(&settings).await?;
        tracing::info!("Seeded site settings");
        Ok(SeedReport {
            inserted: 1,
            upgraded: 0,
        })
    }
}

/// Fields a stored category is missing, with values to fill them
fn category_upgrade(document: &Document, next_order: &mut i64) -> CmsResult<Fields> {
    let mut patch = Fields::new();

    let slug = match document
        .fields
        .get("slug")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
    {
        Some(slug) => slug.to_string(),
        None => {
            patch.insert("slug".to_string(), Value::String(document.id.clone()));
            document.id.clone()
        }
    };

    if !document.fields.get("order").is_some_and(Value::is_number) {
        patch.insert("order".to_string(), Value::from(*next_order));
        *next_order += 1;
    }

    let stored = match document.fields.get("name") {
        Some(Value::String(text)) => Some(LocalizedText::en(text.clone())),
        Some(value @ Value::Object(_)) => serde_json::from_value(value.clone()).ok(),
        _ => None,
    };
    let current = stored.clone().unwrap_or_default();
    let default = defaults::default_category(&slug);

    let mut filled = current.clone();
    for lang in [Language::En, Language::Ar] {
        if !filled.get(lang).trim().is_empty() {
            continue;
        }
        let fallback = default
            .map(|d| match lang {
                Language::En => d.en,
                Language::Ar => d.ar,
            })
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .or_else(|| {
                let other = current.get(lang.other());
                (!other.trim().is_empty()).then(|| other.to_string())
            });
        if let Some(text) = fallback {
            filled.set(lang, text);
        }
    }

    let is_object = matches!(document.fields.get("name"), Some(Value::Object(_)));
    if filled != current || (!is_object && !filled.is_empty()) {
        patch.insert("name".to_string(), serde_json::to_value(&filled)?);
    }

    Ok(patch)
}
