//! # Playback Error Types
//!
//! Errors raised inside the playback controller. None of them cross the
//! [`PlayerHandle`](crate::PlayerHandle) surface: the controller logs them
//! and falls back to a safe state.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur while driving a media session.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// The backend capability failed to initialize.
    #[error("Media backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The platform refused unmuted playback, and the muted retry failed too.
    #[error("Autoplay rejected")]
    AutoplayRejected,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// An asynchronous result arrived for a session that is no longer current.
    #[error("Stale completion discarded")]
    StaleCompletion,

    /// The controller task has shut down.
    #[error("Playback controller closed")]
    ControllerClosed,

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if a later attempt may succeed.
    ///
    /// Backend initialization failures are not retried by the controller, but
    /// a host may rebuild it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::AutoplayRejected
                | PlaybackError::BackendUnavailable(_)
                | PlaybackError::Bridge(BridgeError::AutoplayRejected)
        )
    }

    /// Returns `true` if this error only means some async work was outrun by
    /// a newer request.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            PlaybackError::StaleCompletion | PlaybackError::Bridge(BridgeError::SessionDisposed)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(PlaybackError::AutoplayRejected.is_transient());
        assert!(PlaybackError::Bridge(BridgeError::AutoplayRejected).is_transient());
        assert!(!PlaybackError::ControllerClosed.is_transient());

        assert!(PlaybackError::StaleCompletion.is_stale());
        assert!(PlaybackError::Bridge(BridgeError::SessionDisposed).is_stale());
        assert!(!PlaybackError::AutoplayRejected.is_stale());
    }

    #[test]
    fn bridge_errors_convert() {
        let err: PlaybackError = BridgeError::NotAvailable("widget".to_string()).into();
        assert!(matches!(err, PlaybackError::Bridge(BridgeError::NotAvailable(_))));
    }
}
