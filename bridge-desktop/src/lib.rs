//! # Desktop Bridge Implementations
//!
//! Default implementations of the bridge traits for desktop hosts
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`, with retry and exponential backoff
//! - `MediaBackend` as a headless simulation on a virtual clock, for hosts
//!   without an embeddable web player and for integration tests
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SimulatedMediaBackend};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new());
//! let backend = Arc::new(SimulatedMediaBackend::new());
//! // Hand both to `CoreConfig::builder()`.
//! ```

mod http;
mod media;

pub use http::ReqwestHttpClient;
pub use media::{SimulatedBackendConfig, SimulatedMediaBackend};
