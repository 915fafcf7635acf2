//! Showcase CMS content persistence
//!
//! Flat content collections, the nested photo gallery, site settings and
//! the blob store they reference, on top of a narrow document database
//! client.

pub mod blob_store;
pub mod config;
pub mod content;
pub mod context;
pub mod db;
pub mod error;
pub mod gallery;
pub mod ids;
pub mod seed;
pub mod settings;

pub use context::AppContext;
pub use error::{CmsError, CmsResult};
