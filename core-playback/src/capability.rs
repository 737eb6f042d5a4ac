//! Process-wide media backend bootstrap.
//!
//! [`BackendCapability`] wraps a [`MediaBackend`] so that its `initialize`
//! runs at most once however many sessions ask for it. Concurrent callers
//! wait on the first caller's attempt. A failed attempt is not cached: the
//! next caller tries again.
//!
//! [`BackendCapability::shared`] hands out one capability per backend for
//! the life of the process, so every player built on the same backend shares
//! a single initialization.

use crate::error::{PlaybackError, Result};
use bridge_traits::media::MediaBackend;
use core_async::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

static REGISTRY: OnceLock<Mutex<HashMap<usize, Arc<BackendCapability>>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<usize, Arc<BackendCapability>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

pub struct BackendCapability {
    backend: Arc<dyn MediaBackend>,
    ready: OnceCell<()>,
}

impl BackendCapability {
    /// A capability of its own, outside the process registry.
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            ready: OnceCell::new(),
        }
    }

    /// The process-wide capability for `backend`.
    ///
    /// Backends reporting the same [`MediaBackend::capability_key`] get the
    /// same capability, created on first request.
    pub fn shared(backend: Arc<dyn MediaBackend>) -> Arc<Self> {
        let key = backend.capability_key();
        let mut registry = registry().lock();
        let capability = registry.entry(key).or_insert_with(|| {
            debug!(key, "Registering media backend capability");
            Arc::new(Self::new(backend))
        });
        Arc::clone(capability)
    }

    pub fn backend(&self) -> &Arc<dyn MediaBackend> {
        &self.backend
    }

    /// Initialize the backend unless a previous call already did.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                info!("Initializing media backend");
                self.backend.initialize().await.map_err(|e| {
                    warn!(error = %e, "Media backend initialization failed");
                    PlaybackError::BackendUnavailable(e.to_string())
                })
            })
            .await
            .map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.initialized()
    }
}

impl std::fmt::Debug for BackendCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCapability")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}
