/// Photo gallery
///
/// Countries are root documents; albums and images are embedded inside
/// them and exist nowhere else.

pub mod models;
pub mod repository;

pub use models::{Album, AlbumDraft, Country, GalleryImage};
pub use repository::{GalleryRepository, GALLERY_FOLDER};

/// Collection holding one document per country
pub const COUNTRIES_COLLECTION: &str = "galleryCountries";
