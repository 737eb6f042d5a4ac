//! # Core Configuration Module
//!
//! Configuration for the site player core.
//!
//! ## Overview
//!
//! A builder collects the host bridges and settings and produces a
//! [`CoreConfig`]. Validation runs in `build()` so a misconfigured host fails
//! before any task is spawned.
//!
//! ## Required Dependencies
//!
//! - `MediaBackend` - the embeddable player capability
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - metadata lookups (desktop default: reqwest)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CatalogSource, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .media_backend(Arc::new(MyBackend))
//!     .source(CatalogSource::document(include_str!("songs.json")))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Missing capabilities produce [`Error::CapabilityMissing`] with a message
//! naming the fix; inconsistent settings produce [`Error::Config`].

use crate::error::{Error, Result};
use bridge_traits::{HttpClient, MediaBackend, MountHandle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default metadata lookup endpoint (oEmbed proxy).
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://noembed.com/embed";

/// Where the track catalog reads its source references from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// Source references given directly by the host.
    Inline(Vec<String>),
    /// A JSON source document (array of strings, `{"url"}` or `{"urls"}`).
    Document(String),
    /// A directory whose `*.json` files are source documents.
    Directory(PathBuf),
}

impl CatalogSource {
    pub fn inline<I, S>(refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Inline(refs.into_iter().map(Into::into).collect())
    }

    pub fn document(json: impl Into<String>) -> Self {
        Self::Document(json.into())
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::Directory(path.into())
    }
}

/// Settings for the track catalog's metadata lookup.
///
/// # Example
///
/// ```
/// use core_runtime::config::CatalogConfig;
/// use std::time::Duration;
///
/// let config = CatalogConfig::new()
///     .with_request_timeout(Duration::from_secs(5))
///     .with_metadata_lookup(false);
/// assert!(!config.enable_metadata_lookup);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Lookup endpoint; the source reference is passed as the `url` query
    /// parameter.
    pub metadata_endpoint: String,

    /// Per-request timeout for lookups.
    pub request_timeout: Duration,

    /// When false every track gets the fallback record and no request is made.
    pub enable_metadata_lookup: bool,
}

impl CatalogConfig {
    pub fn new() -> Self {
        Self {
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(10),
            enable_metadata_lookup: true,
        }
    }

    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.metadata_endpoint = endpoint.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_metadata_lookup(mut self, enabled: bool) -> Self {
        self.enable_metadata_lookup = enabled;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Metadata request timeout must be greater than zero".to_string(),
            ));
        }

        if self.enable_metadata_lookup && self.metadata_endpoint.trim().is_empty() {
            return Err(Error::Config(
                "Metadata lookup is enabled but the endpoint is empty. \
                 Set an endpoint or disable lookup."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Core configuration for the site player.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Embeddable player capability (required)
    pub media_backend: Arc<dyn MediaBackend>,

    /// HTTP client for metadata lookups (optional with desktop default)
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Mount point passed to every session
    pub mount: MountHandle,

    /// Catalog inputs, read in order
    pub sources: Vec<CatalogSource>,

    pub catalog: CatalogConfig,

    /// Interval between playback position polls
    pub poll_interval: Duration,

    /// Delay before unmuting after a muted autoplay fallback
    pub unmute_delay: Duration,

    /// Capacity of the core event bus
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("media_backend", &"MediaBackend { ... }")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field("mount", &self.mount)
            .field("sources", &self.sources)
            .field("catalog", &self.catalog)
            .field("poll_interval", &self.poll_interval)
            .field("unmute_delay", &self.unmute_delay)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Timings are non-zero
    /// - The event buffer has capacity
    /// - Metadata lookup has an endpoint and an HTTP client
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "Poll interval must be greater than zero".to_string(),
            ));
        }

        if self.unmute_delay.is_zero() {
            return Err(Error::Config(
                "Unmute delay must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.catalog.validate()?;

        if self.catalog.enable_metadata_lookup && self.http_client.is_none() {
            return Err(Error::Config(
                "Metadata lookup enabled but no HttpClient provided. \
                 Disable lookup or inject an HttpClient implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn media_backend_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MediaBackend".to_string(),
        message: "MediaBackend implementation is required for playback. \
                 Browser: wrap the embeddable player widget. \
                 Desktop: use bridge_desktop::SimulatedMediaBackend or a native player."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Option<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::with_timeout(timeout));
    Some(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Option<Arc<dyn HttpClient>> {
    None
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    media_backend: Option<Arc<dyn MediaBackend>>,
    http_client: Option<Arc<dyn HttpClient>>,
    mount: Option<MountHandle>,
    sources: Vec<CatalogSource>,
    catalog: Option<CatalogConfig>,
    poll_interval: Option<Duration>,
    unmute_delay: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the media backend implementation (required).
    pub fn media_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.media_backend = Some(backend);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the mount point sessions are bound to.
    ///
    /// Default: `media-root`
    pub fn mount(mut self, mount: MountHandle) -> Self {
        self.mount = Some(mount);
        self
    }

    /// Adds a catalog source. Sources are read in the order they are added.
    pub fn source(mut self, source: CatalogSource) -> Self {
        self.sources.push(source);
        self
    }

    /// Adds several catalog sources.
    pub fn sources(mut self, sources: impl IntoIterator<Item = CatalogSource>) -> Self {
        self.sources.extend(sources);
        self
    }

    pub fn catalog_config(mut self, config: CatalogConfig) -> Self {
        self.catalog = Some(config);
        self
    }

    /// Sets the playback position poll interval.
    ///
    /// Default: 500 ms
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the delay before unmuting after an autoplay fallback.
    ///
    /// Default: 200 ms
    pub fn unmute_delay(mut self, delay: Duration) -> Self {
        self.unmute_delay = Some(delay);
        self
    }

    /// Sets the event bus capacity.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns an error if:
    /// - No `MediaBackend` was provided
    /// - Configuration values are invalid
    /// - Metadata lookup is enabled without an HTTP client
    pub fn build(self) -> Result<CoreConfig> {
        let media_backend = self
            .media_backend
            .ok_or_else(media_backend_missing_error)?;

        let catalog = self.catalog.unwrap_or_default();

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None if catalog.enable_metadata_lookup => {
                provide_default_http_client(catalog.request_timeout)
            }
            None => None,
        };

        let config = CoreConfig {
            media_backend,
            http_client,
            mount: self.mount.unwrap_or_default(),
            sources: self.sources,
            catalog,
            poll_interval: self.poll_interval.unwrap_or(Duration::from_millis(500)),
            unmute_delay: self.unmute_delay.unwrap_or(Duration::from_millis(200)),
            event_buffer_size: self.event_buffer_size.unwrap_or(100),
        };

        config.validate()?;

        Ok(config)
    }
}
