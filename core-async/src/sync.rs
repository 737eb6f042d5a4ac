//! Synchronization primitives.
//!
//! Async-aware channels and locks, the one-time cell used for single-flight
//! initialization, and the cancellation token used as a liveness flag by
//! long-running tasks.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::OnceCell;
//!
//! async fn example() {
//!     let cell: OnceCell<u32> = OnceCell::new();
//!     let value = cell.get_or_init(|| async { 7 }).await;
//!     assert_eq!(*value, 7);
//! }
//! ```

pub use tokio::sync::{
    broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify, OnceCell, RwLock,
    RwLockReadGuard, RwLockWriteGuard, Semaphore, SemaphorePermit,
};

pub use tokio_util::sync::{CancellationToken, DropGuard, WaitForCancellationFuture};
