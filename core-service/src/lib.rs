//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (media backend,
//! HTTP) into the shared Rust core: it loads the track catalog, starts the
//! playback controller and exposes the player commands and state to the UI.
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) to get a reqwest HTTP client and the simulated media
//! backend.
//!
//! ```ignore
//! use core_service::{PlayerService, ServiceDependencies};
//! use core_runtime::config::CatalogSource;
//!
//! let config = ServiceDependencies::desktop()
//!     .configure()
//!     .source(CatalogSource::directory("songs"))
//!     .build()?;
//! let service = PlayerService::start(config)?;
//! service.play();
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, media::MediaBackend};
use core_async::sync::watch;
use core_async::task::JoinHandle;
use core_metadata::{CatalogLoad, TrackCatalog};
use core_playback::{
    BackendCapability, PlaybackConfig, PlaybackController, PlayerHandle, PlayerSnapshot,
};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::events::{EventBus, EventStream};
use parking_lot::Mutex;
use tracing::{info, instrument};

/// Bridge implementations the core requires.
#[derive(Clone)]
pub struct ServiceDependencies {
    pub media_backend: Arc<dyn MediaBackend>,
    pub http_client: Option<Arc<dyn HttpClient>>,
}

impl ServiceDependencies {
    pub fn new(media_backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            media_backend,
            http_client: None,
        }
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Desktop defaults: the simulated media backend and a reqwest client.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop() -> Self {
        Self::new(Arc::new(bridge_desktop::SimulatedMediaBackend::new()))
            .with_http_client(Arc::new(bridge_desktop::ReqwestHttpClient::new()))
    }

    /// Start a configuration builder seeded with these bridges.
    pub fn configure(self) -> CoreConfigBuilder {
        let builder = CoreConfig::builder().media_backend(self.media_backend);
        match self.http_client {
            Some(client) => builder.http_client(client),
            None => builder,
        }
    }
}

/// Primary façade exposed to host applications.
///
/// Clones share the same controller and event bus.
#[derive(Clone)]
pub struct PlayerService {
    config: Arc<CoreConfig>,
    events: EventBus,
    player: PlayerHandle,
    catalog: Arc<TrackCatalog>,
    catalog_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl PlayerService {
    /// Validate `config`, spawn the playback controller and start loading
    /// the catalog in the background. Tracks reach the player once the load
    /// finishes.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a runtime context.
    #[instrument(skip_all, fields(sources = config.sources.len()))]
    pub fn start(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let playback = PlaybackConfig::from_core(&config);
        playback
            .validate()
            .map_err(CoreError::InitializationFailed)?;

        let events = EventBus::new(config.event_buffer_size);
        let capability = BackendCapability::shared(Arc::clone(&config.media_backend));
        let player = PlaybackController::new(capability, config.mount.clone(), playback)
            .with_event_bus(events.clone())
            .spawn();
        let catalog = TrackCatalog::from_config(&config).with_event_bus(events.clone());

        let service = Self {
            config: Arc::new(config),
            events,
            player,
            catalog: Arc::new(catalog),
            catalog_task: Arc::new(Mutex::new(None)),
        };
        service.spawn_catalog_load();

        info!("Player service started");
        Ok(service)
    }

    /// Load the catalog from the configured sources and hand the tracks to
    /// the player.
    pub async fn load_catalog(&self) -> CatalogLoad {
        load_into_player(&self.catalog, &self.config, &self.player).await
    }

    /// Restart the background catalog load, cancelling one in progress.
    pub fn reload_catalog(&self) {
        self.spawn_catalog_load();
    }

    fn spawn_catalog_load(&self) {
        let catalog = Arc::clone(&self.catalog);
        let config = Arc::clone(&self.config);
        let player = self.player.clone();

        let task = core_async::spawn(async move {
            load_into_player(&catalog, &config, &player).await;
        });

        if let Some(previous) = self.catalog_task.lock().replace(task) {
            previous.abort();
        }
    }

    // ------------------------------------------------------------------------
    // UI surface
    // ------------------------------------------------------------------------

    pub fn play(&self) {
        self.player.play();
    }

    pub fn pause(&self) {
        self.player.pause();
    }

    pub fn toggle_play(&self) {
        self.player.toggle_play();
    }

    pub fn next(&self) {
        self.player.next();
    }

    pub fn previous(&self) {
        self.player.previous();
    }

    pub fn select_track(&self, index: i64) {
        self.player.select_track(index);
    }

    pub fn toggle_shuffle(&self) {
        self.player.toggle_shuffle();
    }

    pub fn cycle_repeat_mode(&self) {
        self.player.cycle_repeat_mode();
    }

    pub fn seek_to(&self, seconds: f64) {
        self.player.seek_to(seconds);
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.player.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.player.subscribe()
    }

    pub fn events(&self) -> EventStream {
        self.events.stream()
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Stop the catalog load and the controller, disposing the session.
    pub async fn shutdown(&self) {
        if let Some(task) = self.catalog_task.lock().take() {
            task.abort();
        }
        self.player.shutdown().await;
        info!("Player service stopped");
    }
}

async fn load_into_player(
    catalog: &TrackCatalog,
    config: &CoreConfig,
    player: &PlayerHandle,
) -> CatalogLoad {
    let load = catalog.load(&config.sources).await;
    player.set_tracks(load.tracks.clone());
    load
}
