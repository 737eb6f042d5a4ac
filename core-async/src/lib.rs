//! Async runtime abstraction layer for the site player core.
//!
//! All `core-*` and `bridge-*` crates depend on this crate instead of naming
//! Tokio directly, so the executor can be swapped in one place.
//!
//! # Modules
//!
//! - `fs`: Async file reads
//! - `task`: Task spawning
//! - `time`: Sleep, intervals, timeouts
//! - `sync`: Channels, locks, one-time cells and cancellation
//! - `runtime`: Blocking entry points for synchronous callers
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//! use core_async::time::{sleep, Duration};
//!
//! async fn example() {
//!     let handle = task::spawn(async {
//!         sleep(Duration::from_millis(200)).await;
//!         "unmuted"
//!     });
//!     let _ = handle.await;
//! }
//! ```

pub mod fs;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

/// Waits on multiple concurrent branches, returning when the first completes.
pub use tokio::select;
