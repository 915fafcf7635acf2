/// Blob locators: retrievable URLs that encode their storage path
///
/// A locator looks like `https://host/base/o/gallery%2F123.png?alt=media`;
/// the `/o/` segment carries the URL-encoded storage path.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Segment that precedes the encoded storage path
const OBJECT_SEGMENT: &str = "/o/";

/// Why a locator could not be turned back into a storage path
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    #[error("locator is empty")]
    Empty,

    #[error("locator is not an http(s) URL")]
    NotUrl,

    #[error("locator does not point into this blob store")]
    ForeignOrigin,

    #[error("locator has no object segment")]
    MissingObjectSegment,

    #[error("locator path is not valid UTF-8 after decoding")]
    Undecodable,

    #[error("locator decodes to an unsafe path: {0}")]
    UnsafePath(String),
}

/// Opaque retrievable reference to a stored blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobLocator(String);

impl BlobLocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Render the locator for a storage path under `base_url`
    pub fn for_path(base_url: &str, path: &str) -> Self {
        Self(format!(
            "{}{}{}?alt=media",
            base_url.trim_end_matches('/'),
            OBJECT_SEGMENT,
            urlencoding::encode(path)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the storage path embedded in the locator
    pub fn storage_path(&self) -> Result<String, LocatorError> {
        decode_storage_path(&self.0)
    }

    /// Decode the storage path, accepting only locators issued under `base_url`
    pub fn storage_path_under(&self, base_url: &str) -> Result<String, LocatorError> {
        let url = self.0.trim();
        if url.is_empty() {
            return Err(LocatorError::Empty);
        }
        let prefix = format!("{}{}", base_url.trim_end_matches('/'), OBJECT_SEGMENT);
        let encoded = url
            .strip_prefix(prefix.as_str())
            .ok_or(LocatorError::ForeignOrigin)?;
        decode_object_path(encoded)
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlobLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for BlobLocator {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Decode the storage path from a retrievable URL
pub fn decode_storage_path(url: &str) -> Result<String, LocatorError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(LocatorError::Empty);
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or(LocatorError::NotUrl)?;

    // Host must be present before the path
    let slash = rest.find('/').ok_or(LocatorError::MissingObjectSegment)?;
    if slash == 0 {
        return Err(LocatorError::NotUrl);
    }
    let path_and_query = &rest[slash..];

    let start = path_and_query
        .find(OBJECT_SEGMENT)
        .ok_or(LocatorError::MissingObjectSegment)?
        + OBJECT_SEGMENT.len();
    decode_object_path(&path_and_query[start..])
}

/// Decode the part of a locator that follows the object segment
fn decode_object_path(encoded: &str) -> Result<String, LocatorError> {
    let encoded = encoded
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let decoded = urlencoding::decode(encoded)
        .map_err(|_| LocatorError::Undecodable)?
        .into_owned();

    validate_storage_path(&decoded)?;
    Ok(decoded)
}

/// Reject empty, absolute and traversal paths
pub fn validate_storage_path(path: &str) -> Result<(), LocatorError> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(LocatorError::UnsafePath(path.to_string()));
    }
    if path
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(LocatorError::UnsafePath(path.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_locator() {
        let locator = BlobLocator::new("https://store/o/gallery%2F123.png?alt=media");
        assert_eq!(locator.storage_path().unwrap(), "gallery/123.png");
    }

    #[test]
    fn test_decode_with_token_and_fragment() {
        let path = decode_storage_path(
            "https://cdn.example.com/v0/b/site/o/hero%2Fa%20b.mp4?alt=media&token=abc#t=3",
        )
        .unwrap();
        assert_eq!(path, "hero/a b.mp4");
    }

    #[test]
    fn test_for_path_round_trip() {
        let locator = BlobLocator::for_path("https://store/", "news/17_cover image.jpg");
        assert_eq!(
            locator.as_str(),
            "https://store/o/news%2F17_cover%20image.jpg?alt=media"
        );
        assert_eq!(locator.storage_path().unwrap(), "news/17_cover image.jpg");
    }

    #[test]
    fn test_malformed_locators() {
        assert_eq!(decode_storage_path(""), Err(LocatorError::Empty));
        assert_eq!(decode_storage_path("   "), Err(LocatorError::Empty));
        assert_eq!(decode_storage_path("gallery/123.png"), Err(LocatorError::NotUrl));
        assert_eq!(decode_storage_path("ftp://x/o/a"), Err(LocatorError::NotUrl));
        assert_eq!(
            decode_storage_path("https://store/images/a.png"),
            Err(LocatorError::MissingObjectSegment)
        );
        assert_eq!(
            decode_storage_path("https://store"),
            Err(LocatorError::MissingObjectSegment)
        );
    }

    #[test]
    fn test_storage_path_under_base() {
        let locator = BlobLocator::new("https://store/o/gallery%2F123.png?alt=media");
        assert_eq!(locator.storage_path_under("https://store/").unwrap(), "gallery/123.png");
        assert_eq!(
            locator.storage_path_under("https://cdn.example.com"),
            Err(LocatorError::ForeignOrigin)
        );

        let nested = BlobLocator::new("https://store.example.com/anything/o/gallery%2F123.png");
        assert_eq!(
            nested.storage_path_under("https://store"),
            Err(LocatorError::ForeignOrigin)
        );
        assert_eq!(
            BlobLocator::new(" ").storage_path_under("https://store"),
            Err(LocatorError::Empty)
        );
        assert!(matches!(
            BlobLocator::new("https://store/o/..%2Fsecret").storage_path_under("https://store"),
            Err(LocatorError::UnsafePath(_))
        ));
    }

    #[test]
    fn test_unsafe_paths_rejected() {
        assert!(matches!(
            decode_storage_path("https://store/o/..%2Fsecret"),
            Err(LocatorError::UnsafePath(_))
        ));
        assert!(matches!(
            decode_storage_path("https://store/o/?alt=media"),
            Err(LocatorError::UnsafePath(_))
        ));
        assert!(matches!(
            decode_storage_path("https://store/o/%2Fetc%2Fpasswd"),
            Err(LocatorError::UnsafePath(_))
        ));
    }

    #[test]
    fn test_serde_transparent() {
        let locator = BlobLocator::new("https://store/o/a.png");
        let json = serde_json::to_string(&locator).unwrap();
        assert_eq!(json, "\"https://store/o/a.png\"");
        let back: BlobLocator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locator);
    }
}
