//! # Event Bus System
//!
//! Typed lifecycle events for the site player, carried over a broadcast
//! channel.
//!
//! ## Overview
//!
//! - **Event Types**: [`CoreEvent`] wraps one enum per domain
//! - **EventBus**: broadcast channel for publishing events
//! - **EventStream**: receiver wrapper with optional filtering
//!
//! Events describe what happened (a track changed, a session became ready,
//! the backend is unavailable). The continuously changing UI state such as
//! the playback position is published separately as a snapshot and never
//! goes through the bus.
//!
//! ```text
//! ┌─────────────┐     emit      ┌───────────┐     subscribe    ┌────────────┐
//! │   Catalog   ├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               │ EventBus  │                  └────────────┘
//! ┌─────────────┐     emit      │           │     subscribe    ┌────────────┐
//! │ Controller  ├──────────────>│           ├─────────────────>│ Subscriber │
//! └─────────────┘               └───────────┘                  └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! let bus = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::Stopped)).ok();
//! assert!(stream.try_recv().is_ok());
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving.
//! - **`RecvError::Closed`**: every sender is gone, treat as shutdown.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Track catalog loading
    Catalog(CatalogEvent),
    /// Playback controller lifecycle
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Human-readable description, for logs.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::BackendUnavailable { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::AutoplayFallback { .. }) => EventSeverity::Warning,
            CoreEvent::Catalog(CatalogEvent::Loaded { fallbacks, .. }) if *fallbacks > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Catalog(CatalogEvent::Loaded { .. }) => EventSeverity::Info,
            CoreEvent::Playback(PlaybackEvent::SessionReady { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// Source references collected and deduplicated; lookup is starting.
    Loading { sources: usize },
    /// Track records are ready. `fallbacks` counts records whose lookup
    /// failed or was skipped.
    Loaded { tracks: usize, fallbacks: usize },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::Loading { .. } => "Resolving track metadata",
            CatalogEvent::Loaded { .. } => "Track catalog loaded",
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    /// The current track changed (selection, next/previous or ended policy).
    TrackChanged { index: usize, track_id: u32 },
    /// Play intent was applied to a ready session.
    Started { track_id: u32 },
    /// Pause intent was applied.
    Paused { track_id: u32 },
    /// The backend reported the end of the current track.
    Ended { track_id: u32 },
    /// A session finished its first load.
    SessionReady { session_id: String },
    /// The backend capability failed to initialize; playback is disabled.
    BackendUnavailable { reason: String },
    /// Direct play was rejected and the muted fallback was used.
    AutoplayFallback { session_id: String },
    /// The controller was torn down.
    Stopped,
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackChanged { .. } => "Current track changed",
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Ended { .. } => "Track ended",
            PlaybackEvent::SessionReady { .. } => "Media session ready",
            PlaybackEvent::BackendUnavailable { .. } => "Media backend unavailable",
            PlaybackEvent::AutoplayFallback { .. } => "Autoplay rejected, muted fallback used",
            PlaybackEvent::Stopped => "Playback stopped",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast bus. Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event, returning the number of subscribers that received it.
    ///
    /// Fails only when nobody is subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Subscribe through an [`EventStream`] so a filter can be attached.
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver that skips events rejected by an optional predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive; `None` when no matching event is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
