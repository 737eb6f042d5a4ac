//! # Track Catalog
//!
//! Turns configured source references into [`Track`] records.
//!
//! ## Overview
//!
//! - Source documents (JSON) are parsed and deduplicated in natural order
//! - Each reference is enriched through a [`MetadataLookup`], by default the
//!   noembed oEmbed proxy
//! - A failed lookup degrades to a fallback record for that track only

pub mod catalog;
pub mod error;
pub mod models;
pub mod providers;
pub mod sources;

pub use catalog::{CatalogLoad, MetadataLookup, TrackCatalog};
pub use error::{MetadataError, Result};
pub use models::{Track, TrackMetadata, UNKNOWN_ARTIST};
pub use providers::NoembedClient;
