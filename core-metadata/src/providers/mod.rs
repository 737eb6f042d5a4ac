//! External Metadata Providers
//!
//! Clients that resolve a source reference into display metadata. Each
//! provider implements [`MetadataLookup`](crate::catalog::MetadataLookup).

pub mod noembed;

pub use noembed::NoembedClient;
