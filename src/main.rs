/// Showcase CMS maintenance tool
///
/// Opens the configured document database and blob store, seeds default
/// catalog data when asked to, and logs what each collection holds.

use showcase_cms::{
    config::CmsConfig,
    content::{ContentRecord, DocumentRepository},
    context::AppContext,
    error::CmsResult,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> CmsResult<()> {
    // Load configuration
    let config = CmsConfig::from_env()?;

    // Initialize logging
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .init();

    tracing::info!("Showcase CMS v{}", env!("CARGO_PKG_VERSION"));

    let seed = config.seed.on_start || std::env::args().any(|arg| arg == "--seed");

    // Create application context
    let ctx = AppContext::new(config).await?;

    if seed {
        let report = ctx.seeder().seed_all().await?;
        tracing::info!(
            "Seed run: {} inserted, {} upgraded",
            report.inserted,
            report.upgraded
        );
    }

    log_collection(&ctx.hero_slides).await;
    log_collection(&ctx.products).await;
    log_collection(&ctx.gift_products).await;
    log_collection(&ctx.categories).await;
    log_collection(&ctx.news).await;
    log_collection(&ctx.orders).await;
    log_collection(&ctx.messages).await;

    let countries = ctx.gallery.list_countries().await;
    let albums: usize = countries.iter().map(|c| c.albums.len()).sum();
    let images: usize = countries
        .iter()
        .flat_map(|c| &c.albums)
        .map(|a| a.images.len())
        .sum();
    tracing::info!(
        "gallery: {} countries, {} albums, {} images",
        countries.len(),
        albums,
        images
    );

    let settings = ctx.settings.get().await;
    tracing::info!(
        "settings: {} phones, {} emails, {} locations, logo {}",
        settings.phones.len(),
        settings.emails.len(),
        settings.locations.len(),
        if settings.logo_url.is_some() { "set" } else { "unset" }
    );

    Ok(())
}

async fn log_collection<T: ContentRecord>(repo: &DocumentRepository<T>) {
    let records = repo.list(None).await;
    tracing::info!("{}: {} documents", repo.collection(), records.len());
}
