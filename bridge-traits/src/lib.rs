//! # Host Bridge Traits
//!
//! Capabilities the player core needs from its host but cannot provide
//! itself.
//!
//! ## Traits
//!
//! ### Media
//! - [`MediaBackend`](media::MediaBackend) - Process-wide player capability and session factory
//! - [`MediaSession`](media::MediaSession) - One embedded player instance (load, play, pause, seek)
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP for best-effort metadata lookups
//!
//! ### Logging
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Implementations
//!
//! | Host    | Crate            | Notes |
//! |---------|------------------|-------|
//! | Desktop | `bridge-desktop` | reqwest HTTP client, simulated media backend |
//! | Browser | host-provided    | wraps the embeddable player widget |
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast when a required capability is missing:
//!
//! ```ignore
//! let backend = builder.media_backend
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "MediaBackend".to_string(),
//!         message: "No media backend provided.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits report through [`BridgeError`](error::BridgeError).
//! Implementations should map platform errors onto it and keep the message
//! actionable.
//!
//! ## Thread Safety
//!
//! Backends and clients are shared across tasks and require `Send + Sync`.
//! A [`MediaSession`](media::MediaSession) is owned by exactly one
//! controller and only needs `Send`.

pub mod error;
pub mod http;
pub mod logging;
pub mod media;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use media::{
    MediaBackend, MediaSession, MountHandle, SessionEvent, SessionEventSink, SessionId,
};
pub use logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
