//! Workspace façade crate.
//!
//! Host applications depend on `site-player-workspace` and pick a feature
//! (`desktop-shims` for the reqwest/simulated bridges, `headless` to inject
//! their own) instead of wiring each workspace crate individually.

#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_metadata::Track;
#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_playback::{PlayerSnapshot, RepeatMode};
#[cfg(any(feature = "desktop-shims", feature = "headless"))]
pub use core_service::{PlayerService, ServiceDependencies};
