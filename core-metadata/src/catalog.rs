//! Track catalog: source references in, track records out.
//!
//! Loading never fails as a whole. Every reference yields exactly one
//! [`Track`]; a failed or disabled lookup produces the fallback record and
//! the batch moves on. Lookups run one at a time in natural order.

use crate::error::Result;
use crate::models::{Track, TrackMetadata};
use crate::providers::NoembedClient;
use crate::sources::{collect_source_refs, dedupe_preserving_order};
use async_trait::async_trait;
use core_runtime::config::{CatalogSource, CoreConfig};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Resolves a source reference into display metadata.
#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, source_ref: &str) -> Result<TrackMetadata>;
}

/// Outcome of a catalog load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLoad {
    pub tracks: Vec<Track>,
    /// Records built from the fallback because the lookup failed or was
    /// disabled.
    pub fallbacks: usize,
}

pub struct TrackCatalog {
    lookup: Option<Arc<dyn MetadataLookup>>,
    event_bus: Option<EventBus>,
}

impl TrackCatalog {
    /// `None` disables lookups: every record is the fallback record.
    pub fn new(lookup: Option<Arc<dyn MetadataLookup>>) -> Self {
        Self {
            lookup,
            event_bus: None,
        }
    }

    /// Build a catalog backed by noembed when lookup is enabled and an HTTP
    /// client is configured.
    pub fn from_config(config: &CoreConfig) -> Self {
        let lookup = match (&config.http_client, config.catalog.enable_metadata_lookup) {
            (Some(http_client), true) => {
                let client = NoembedClient::from_config(Arc::clone(http_client), &config.catalog);
                Some(Arc::new(client) as Arc<dyn MetadataLookup>)
            }
            _ => None,
        };
        Self::new(lookup)
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Collect references from `sources` and resolve them.
    pub async fn load(&self, sources: &[CatalogSource]) -> CatalogLoad {
        let refs = collect_source_refs(sources).await;
        self.resolve(refs).await
    }

    /// Resolve references into tracks, ids assigned from 1.
    #[instrument(skip_all, fields(sources = refs.len()))]
    pub async fn resolve(&self, refs: Vec<String>) -> CatalogLoad {
        let refs = dedupe_preserving_order(refs);
        self.emit(CatalogEvent::Loading {
            sources: refs.len(),
        });

        let mut load = CatalogLoad {
            tracks: Vec::with_capacity(refs.len()),
            fallbacks: 0,
        };

        for (id, source_ref) in (1u32..).zip(refs) {
            let track = match &self.lookup {
                Some(lookup) => match lookup.lookup(&source_ref).await {
                    Ok(metadata) => Track::from_metadata(id, source_ref, metadata),
                    Err(e) => {
                        warn!(track_id = id, source = %source_ref, error = %e, "Metadata lookup failed");
                        load.fallbacks += 1;
                        Track::fallback(id, source_ref)
                    }
                },
                None => {
                    load.fallbacks += 1;
                    Track::fallback(id, source_ref)
                }
            };
            load.tracks.push(track);
        }

        info!(
            tracks = load.tracks.len(),
            fallbacks = load.fallbacks,
            "Track catalog loaded"
        );
        self.emit(CatalogEvent::Loaded {
            tracks: load.tracks.len(),
            fallbacks: load.fallbacks,
        });

        load
    }

    fn emit(&self, event: CatalogEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Catalog(event)).ok();
        }
    }
}
