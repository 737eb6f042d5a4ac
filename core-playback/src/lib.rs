//! # Playback Module
//!
//! Queue ordering and playback control for the site player.
//!
//! ## Overview
//!
//! This module handles:
//! - Track order: natural and shuffled, with repeat modes ([`QueueEngine`])
//! - One-time media backend bootstrap ([`BackendCapability`])
//! - Driving a media session from play/pause intent, including the autoplay
//!   fallback and the end-of-track policy ([`PlaybackController`])
//! - The UI-facing command and state surface ([`PlayerHandle`],
//!   [`PlayerSnapshot`])
//!
//! ## Example
//!
//! ```ignore
//! use core_playback::{BackendCapability, PlaybackConfig, PlaybackController};
//!
//! let capability = BackendCapability::shared(backend);
//! let player = PlaybackController::new(capability, mount, PlaybackConfig::default()).spawn();
//! player.set_tracks(tracks);
//! player.play();
//! ```

pub mod capability;
pub mod config;
pub mod controller;
pub mod error;
pub mod queue;

pub use capability::BackendCapability;
pub use config::PlaybackConfig;
pub use controller::{
    PlaybackController, PlayerCommand, PlayerHandle, PlayerSnapshot, SessionPhase,
};
pub use error::{PlaybackError, Result};
pub use queue::{generate_shuffle_order, Direction, QueueEngine, RepeatMode};
