//! # Player Service Demo
//!
//! Loads a catalog from a directory of source documents, plays through the
//! queue on the simulated backend and prints state changes.
//!
//! Run with: `cargo run --example player_demo --package core-service -- <songs-dir>`
//!
//! Set `RUST_LOG=debug` for controller transitions.

use anyhow::Context;
use bridge_desktop::{SimulatedBackendConfig, SimulatedMediaBackend};
use core_runtime::config::{CatalogConfig, CatalogSource};
use core_runtime::events::{CatalogEvent, CoreEvent};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::{PlayerService, ServiceDependencies};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("failed to initialize logging")?;

    let source = match std::env::args().nth(1) {
        Some(dir) => CatalogSource::directory(dir),
        None => CatalogSource::inline([
            "https://www.youtube.com/watch?v=aqz-KE-bpKQ",
            "https://www.youtube.com/watch?v=ScMzIvxBSi4",
        ]),
    };

    // Short items so the whole queue plays in a few seconds.
    let backend = SimulatedMediaBackend::with_config(
        SimulatedBackendConfig::default().with_item_duration(Duration::from_secs(3)),
    );
    let config = ServiceDependencies::desktop()
        .configure()
        .media_backend(Arc::new(backend))
        .source(source)
        .catalog_config(CatalogConfig::new().with_metadata_lookup(false))
        .build()
        .context("invalid player configuration")?;

    let service = PlayerService::start(config)?;
    let mut catalog = service
        .events()
        .filter(|event| matches!(event, CoreEvent::Catalog(CatalogEvent::Loaded { .. })));
    if let CoreEvent::Catalog(CatalogEvent::Loaded { tracks, fallbacks }) = catalog.recv().await? {
        println!("Loaded {tracks} tracks ({fallbacks} without metadata)");
        if tracks == 0 {
            service.shutdown().await;
            return Ok(());
        }
    }

    let mut state = service.subscribe();
    state.wait_for(|s| !s.tracks.is_empty()).await?;
    service.play();

    let mut last_index = None;
    loop {
        state.changed().await?;
        let snapshot = state.borrow_and_update().clone();

        if last_index != Some(snapshot.current_index) {
            if let Some(track) = &snapshot.current_track {
                println!("▶ {} - {}", track.artist, track.title);
            }
            last_index = Some(snapshot.current_index);
        }

        // Back on the first track and stopped: the queue ran out.
        if !snapshot.is_playing && snapshot.current_index == 0 && snapshot.current_time == 0.0 {
            break;
        }
    }

    service.shutdown().await;
    Ok(())
}
