//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the site player core:
//! - Configuration with fail-fast validation
//! - Logging and tracing setup
//! - Event bus for lifecycle events
//!
//! Every other `core-*` crate depends on this one for its config types,
//! logging conventions and event definitions.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
