//! Runtime utilities that abstract over the underlying async executor.
//!
//! Downstream crates never build a Tokio runtime themselves; synchronous
//! entry points (logging sinks, host bootstrap code) go through here.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a fresh current-thread runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be built or when called from inside an
/// existing runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}
