//! Track records produced by the catalog.

use serde::{Deserialize, Serialize};

/// Artist shown when a lookup fails or the provider omits the author.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Immutable track record.
///
/// `id` is assigned sequentially from 1 in natural (catalog) order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: u32,
    pub title: String,
    pub artist: String,
    /// Artwork URL; empty when unknown.
    pub artwork_ref: String,
    /// Reference the media backend loads.
    pub source_ref: String,
}

impl Track {
    /// Record used when metadata is unavailable: the source doubles as title.
    pub fn fallback(id: u32, source_ref: impl Into<String>) -> Self {
        let source_ref = source_ref.into();
        Self {
            id,
            title: source_ref.clone(),
            artist: UNKNOWN_ARTIST.to_string(),
            artwork_ref: String::new(),
            source_ref,
        }
    }

    /// Build a record from a lookup result, filling missing fields.
    pub fn from_metadata(id: u32, source_ref: impl Into<String>, metadata: TrackMetadata) -> Self {
        let source_ref = source_ref.into();
        Self {
            id,
            title: metadata.title.unwrap_or_else(|| source_ref.clone()),
            artist: metadata
                .artist
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
            artwork_ref: metadata.artwork_ref.unwrap_or_default(),
            source_ref,
        }
    }
}

/// Fields a metadata provider may return for a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork_ref: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_uses_source_as_title() {
        let track = Track::fallback(4, "https://youtu.be/abc");
        assert_eq!(track.id, 4);
        assert_eq!(track.title, "https://youtu.be/abc");
        assert_eq!(track.artist, UNKNOWN_ARTIST);
        assert!(track.artwork_ref.is_empty());
        assert_eq!(track.source_ref, "https://youtu.be/abc");
    }

    #[test]
    fn partial_metadata_fills_each_field() {
        let metadata = TrackMetadata {
            title: None,
            artist: Some("Nujabes".to_string()),
            artwork_ref: None,
        };
        let track = Track::from_metadata(1, "src", metadata);
        assert_eq!(track.title, "src");
        assert_eq!(track.artist, "Nujabes");
        assert_eq!(track.artwork_ref, "");
    }
}
