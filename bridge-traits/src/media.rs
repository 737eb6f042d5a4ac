//! Media backend bridge traits.
//!
//! The playback controller never talks to a concrete media widget. Hosts wrap
//! whatever embeddable player they have (an iframe video player used as an
//! audio source, a native audio element, a simulated clock) behind
//! [`MediaBackend`] and [`MediaSession`], and report lifecycle signals back
//! through a [`SessionEventSink`].
//!
//! ## Lifecycle
//!
//! 1. [`MediaBackend::initialize`] prepares the global capability (for a web
//!    widget this loads the third-party script). Callers route this through a
//!    single-flight wrapper so it runs at most once per process.
//! 2. [`MediaBackend::create_session`] binds a session to a mount point.
//! 3. [`MediaSession::load`] feeds a source reference. The first completed
//!    load emits [`SessionEvent::Ready`]; every time playback reaches the end
//!    of the current item the session emits [`SessionEvent::Ended`].
//! 4. [`MediaSession::dispose`] releases the widget.

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a media session owned by the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new session identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Construct an identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Borrow the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque mount point a session is bound to.
///
/// In a browser host this names the container element; desktop hosts use it
/// as a label only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MountHandle(String);

impl MountHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MountHandle {
    fn default() -> Self {
        Self::new("media-root")
    }
}

/// Lifecycle signal emitted by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Emitted once, after the first load completes.
    Ready,
    /// Emitted each time playback reaches the end of the current item.
    Ended,
}

/// Callback through which a session reports [`SessionEvent`]s.
///
/// The controller builds one sink per session and tags it with that
/// session's id, so a sink outliving its session is harmless.
#[derive(Clone)]
pub struct SessionEventSink {
    emit: Arc<dyn Fn(SessionEvent) + Send + Sync>,
}

impl SessionEventSink {
    pub fn new<F>(emit: F) -> Self
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        Self {
            emit: Arc::new(emit),
        }
    }

    /// A sink that drops every event.
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    pub fn emit(&self, event: SessionEvent) {
        (self.emit)(event)
    }
}

impl fmt::Debug for SessionEventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEventSink").finish_non_exhaustive()
    }
}

/// One live instance of an embeddable media widget.
///
/// Control calls are synchronous, matching the widgets this wraps; anything
/// asynchronous is reported through the session's [`SessionEventSink`].
pub trait MediaSession: Send {
    /// Load a new source into this session, replacing the current item.
    fn load(&mut self, source_ref: &str) -> Result<()>;

    /// Start or resume playback.
    ///
    /// Returns [`BridgeError::AutoplayRejected`](crate::error::BridgeError::AutoplayRejected)
    /// when the platform blocks unmuted playback.
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn mute(&mut self) -> Result<()>;

    fn unmute(&mut self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    fn seek_to(&mut self, seconds: f64) -> Result<()>;

    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Duration of the current item in seconds (0 when unknown).
    fn duration(&self) -> f64;

    /// Release the widget. Calls after dispose are no-ops.
    fn dispose(&mut self);
}

/// Factory for media sessions, backed by a process-wide capability.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Prepare the global capability (e.g. load a third-party player script).
    ///
    /// Implementations may assume this is invoked through a single-flight
    /// guard and need not deduplicate concurrent calls themselves.
    async fn initialize(&self) -> Result<()>;

    /// Identity of the capability behind this handle.
    ///
    /// Handles that share one underlying capability (clones over shared
    /// state) must return the same key so they share one initialization.
    /// Defaults to the address of `self`.
    fn capability_key(&self) -> usize {
        self as *const Self as *const () as usize
    }

    /// Create a session bound to `mount` that reports through `events`.
    async fn create_session(
        &self,
        mount: &MountHandle,
        events: SessionEventSink,
    ) -> Result<Box<dyn MediaSession>>;
}
