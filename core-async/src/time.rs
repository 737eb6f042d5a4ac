//! Time-related abstractions.
//!
//! Re-exports the timer primitives used by the playback controller (fixed
//! interval polling, delayed unmute) plus a helper that builds an interval
//! which does not burst after a stall.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(10)).await;
//!     assert!(start.elapsed() >= Duration::from_millis(10));
//! }
//! ```

pub use tokio::time::{
    interval, interval_at, sleep, sleep_until, timeout, Interval, MissedTickBehavior, Sleep,
    Timeout,
};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Creates an interval whose first tick fires one `period` from now and that
/// skips missed ticks instead of firing them back to back.
///
/// # Panics
///
/// Panics if `period` is zero, like [`tokio::time::interval`].
pub fn polling_interval(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
