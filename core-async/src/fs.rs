//! Async filesystem helpers re-exported from the underlying runtime.
//!
//! Only the read side the catalog loader needs is exposed.

pub use tokio::fs::{read_dir, read_to_string, DirEntry, ReadDir};
