//! Headless media backend driven by a virtual clock.
//!
//! Desktop hosts have no embeddable web player, so this backend stands in
//! for one: it tracks a playback position per session, advances it on a
//! fixed tick while playing and reports `Ready`/`Ended` through the session's
//! event sink exactly like a widget would.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    media::{MediaBackend, MediaSession, MountHandle, SessionEvent, SessionEventSink},
};
use core_async::sync::CancellationToken;
use core_async::time::{self, Duration};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Behaviour knobs for [`SimulatedMediaBackend`].
#[derive(Debug, Clone)]
pub struct SimulatedBackendConfig {
    /// Make `initialize` fail, as when the player script cannot be fetched.
    pub fail_initialize: bool,
    /// Reject `play` with `AutoplayRejected` unless the session is muted.
    pub autoplay_requires_mute: bool,
    /// Delay between `load` and the first `Ready` signal.
    pub load_latency: Duration,
    /// Delay `initialize` takes to complete.
    pub init_latency: Duration,
    /// Length of any item without an explicit override.
    pub item_duration: Duration,
    /// Virtual clock resolution.
    pub tick: Duration,
    /// Per-source duration overrides.
    pub durations: HashMap<String, Duration>,
    /// Sources `load` rejects, as a widget does for links it cannot play.
    pub unplayable: HashSet<String>,
}

impl Default for SimulatedBackendConfig {
    fn default() -> Self {
        Self {
            fail_initialize: false,
            autoplay_requires_mute: false,
            load_latency: Duration::from_millis(50),
            init_latency: Duration::from_millis(10),
            item_duration: Duration::from_secs(180),
            tick: Duration::from_millis(100),
            durations: HashMap::new(),
            unplayable: HashSet::new(),
        }
    }
}

impl SimulatedBackendConfig {
    pub fn with_failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    pub fn with_autoplay_blocked(mut self) -> Self {
        self.autoplay_requires_mute = true;
        self
    }

    pub fn with_item_duration(mut self, duration: Duration) -> Self {
        self.item_duration = duration;
        self
    }

    pub fn with_duration_for(mut self, source_ref: impl Into<String>, duration: Duration) -> Self {
        self.durations.insert(source_ref.into(), duration);
        self
    }

    pub fn with_unplayable(mut self, source_ref: impl Into<String>) -> Self {
        self.unplayable.insert(source_ref.into());
        self
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    fn duration_of(&self, source_ref: &str) -> Duration {
        self.durations
            .get(source_ref)
            .copied()
            .unwrap_or(self.item_duration)
    }
}

#[derive(Debug, Default)]
struct Counters {
    initialize: AtomicUsize,
    sessions: AtomicUsize,
    disposed: AtomicUsize,
}

/// [`MediaBackend`] that simulates an embeddable player on a virtual clock.
#[derive(Debug, Clone)]
pub struct SimulatedMediaBackend {
    config: Arc<SimulatedBackendConfig>,
    counters: Arc<Counters>,
}

impl SimulatedMediaBackend {
    pub fn new() -> Self {
        Self::with_config(SimulatedBackendConfig::default())
    }

    pub fn with_config(config: SimulatedBackendConfig) -> Self {
        Self {
            config: Arc::new(config),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Number of times `initialize` has run.
    pub fn initialize_count(&self) -> usize {
        self.counters.initialize.load(Ordering::SeqCst)
    }

    /// Number of sessions created so far.
    pub fn session_count(&self) -> usize {
        self.counters.sessions.load(Ordering::SeqCst)
    }

    /// Number of sessions disposed so far.
    pub fn disposed_count(&self) -> usize {
        self.counters.disposed.load(Ordering::SeqCst)
    }
}

impl Default for SimulatedMediaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaBackend for SimulatedMediaBackend {
    async fn initialize(&self) -> Result<()> {
        self.counters.initialize.fetch_add(1, Ordering::SeqCst);
        time::sleep(self.config.init_latency).await;

        if self.config.fail_initialize {
            warn!("Simulated media backend initialization failed");
            return Err(BridgeError::NotAvailable(
                "simulated player script unavailable".to_string(),
            ));
        }

        info!("Simulated media backend initialized");
        Ok(())
    }

    fn capability_key(&self) -> usize {
        Arc::as_ptr(&self.counters) as usize
    }

    async fn create_session(
        &self,
        mount: &MountHandle,
        events: SessionEventSink,
    ) -> Result<Box<dyn MediaSession>> {
        self.counters.sessions.fetch_add(1, Ordering::SeqCst);
        debug!(mount = mount.as_str(), "Creating simulated media session");

        Ok(Box::new(SimulatedSession::start(
            Arc::clone(&self.config),
            Arc::clone(&self.counters),
            events,
        )))
    }
}

#[derive(Debug, Default)]
struct Playhead {
    source: Option<String>,
    playing: bool,
    muted: bool,
    position: f64,
    duration: f64,
    ready_sent: bool,
}

struct SimulatedSession {
    config: Arc<SimulatedBackendConfig>,
    counters: Arc<Counters>,
    events: SessionEventSink,
    playhead: Arc<Mutex<Playhead>>,
    alive: CancellationToken,
}

impl SimulatedSession {
    fn start(
        config: Arc<SimulatedBackendConfig>,
        counters: Arc<Counters>,
        events: SessionEventSink,
    ) -> Self {
        let session = Self {
            config,
            counters,
            events,
            playhead: Arc::new(Mutex::new(Playhead::default())),
            alive: CancellationToken::new(),
        };
        session.spawn_clock();
        session
    }

    fn spawn_clock(&self) {
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();
        let alive = self.alive.clone();
        let tick = self.config.tick;

        core_async::spawn(async move {
            let mut ticker = time::polling_interval(tick);
            loop {
                core_async::select! {
                    _ = alive.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let ended = {
                    let mut head = playhead.lock();
                    if !head.playing {
                        continue;
                    }
                    head.position = (head.position + tick.as_secs_f64()).min(head.duration);
                    if head.position >= head.duration {
                        head.playing = false;
                        true
                    } else {
                        false
                    }
                };

                if ended {
                    events.emit(SessionEvent::Ended);
                }
            }
        });
    }

    fn ensure_live(&self) -> Result<()> {
        if self.alive.is_cancelled() {
            Err(BridgeError::SessionDisposed)
        } else {
            Ok(())
        }
    }
}

impl MediaSession for SimulatedSession {
    fn load(&mut self, source_ref: &str) -> Result<()> {
        self.ensure_live()?;
        if self.config.unplayable.contains(source_ref) {
            return Err(BridgeError::OperationFailed(format!(
                "unplayable source: {source_ref}"
            )));
        }

        let send_ready = {
            let mut head = self.playhead.lock();
            head.source = Some(source_ref.to_string());
            head.position = 0.0;
            head.duration = self.config.duration_of(source_ref).as_secs_f64();
            head.playing = false;
            !std::mem::replace(&mut head.ready_sent, true)
        };

        debug!(source = source_ref, "Simulated session loaded source");

        if send_ready {
            let events = self.events.clone();
            let alive = self.alive.clone();
            let latency = self.config.load_latency;
            core_async::spawn(async move {
                time::sleep(latency).await;
                if !alive.is_cancelled() {
                    events.emit(SessionEvent::Ready);
                }
            });
        }

        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.ensure_live()?;

        let mut head = self.playhead.lock();
        if head.source.is_none() {
            return Err(BridgeError::OperationFailed("no source loaded".to_string()));
        }
        if self.config.autoplay_requires_mute && !head.muted {
            return Err(BridgeError::AutoplayRejected);
        }
        head.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.playhead.lock().playing = false;
        Ok(())
    }

    fn mute(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.playhead.lock().muted = true;
        Ok(())
    }

    fn unmute(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.playhead.lock().muted = false;
        Ok(())
    }

    fn seek_to(&mut self, seconds: f64) -> Result<()> {
        self.ensure_live()?;
        let mut head = self.playhead.lock();
        head.position = seconds.clamp(0.0, head.duration);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.playhead.lock().position
    }

    fn duration(&self) -> f64 {
        self.playhead.lock().duration
    }

    fn dispose(&mut self) {
        if self.alive.is_cancelled() {
            return;
        }
        self.alive.cancel();
        self.playhead.lock().playing = false;
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
        debug!("Simulated media session disposed");
    }
}

impl Drop for SimulatedSession {
    fn drop(&mut self) {
        self.alive.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn recording_sink() -> (SessionEventSink, Arc<StdMutex<Vec<SessionEvent>>>) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink = SessionEventSink::new(move |event| sink_seen.lock().unwrap().push(event));
        (sink, seen)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_emitted_once_after_first_load() {
        let backend = SimulatedMediaBackend::new();
        let (sink, seen) = recording_sink();
        let mut session = backend
            .create_session(&MountHandle::default(), sink)
            .await
            .unwrap();

        session.load("https://youtu.be/a").unwrap();
        time::sleep(Duration::from_millis(60)).await;
        session.load("https://youtu.be/b").unwrap();
        time::sleep(Duration::from_millis(60)).await;

        assert_eq!(*seen.lock().unwrap(), vec![SessionEvent::Ready]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_after_item_duration() {
        let config = SimulatedBackendConfig::default().with_item_duration(Duration::from_secs(1));
        let backend = SimulatedMediaBackend::with_config(config);
        let (sink, seen) = recording_sink();
        let mut session = backend
            .create_session(&MountHandle::default(), sink)
            .await
            .unwrap();

        session.load("track").unwrap();
        session.play().unwrap();
        time::sleep(Duration::from_millis(1150)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![SessionEvent::Ready, SessionEvent::Ended]
        );
        assert_eq!(session.current_time(), 1.0);
        assert_eq!(session.duration(), 1.0);
    }

    #[tokio::test]
    async fn test_autoplay_blocked_until_muted() {
        let config = SimulatedBackendConfig::default().with_autoplay_blocked();
        let backend = SimulatedMediaBackend::with_config(config);
        let mut session = backend
            .create_session(&MountHandle::default(), SessionEventSink::noop())
            .await
            .unwrap();

        session.load("track").unwrap();
        assert!(matches!(session.play(), Err(BridgeError::AutoplayRejected)));
        session.mute().unwrap();
        session.play().unwrap();
        session.unmute().unwrap();
    }

    #[tokio::test]
    async fn test_failing_initialize() {
        let backend = SimulatedMediaBackend::with_config(
            SimulatedBackendConfig::default().with_failing_initialize(),
        );
        assert!(backend.initialize().await.is_err());
        assert_eq!(backend.initialize_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unplayable_source_is_rejected_without_ready() {
        let config = SimulatedBackendConfig::default().with_unplayable("not-a-video");
        let backend = SimulatedMediaBackend::with_config(config);
        let (sink, seen) = recording_sink();
        let mut session = backend
            .create_session(&MountHandle::default(), sink)
            .await
            .unwrap();

        assert!(matches!(
            session.load("not-a-video"),
            Err(BridgeError::OperationFailed(_))
        ));
        time::sleep(Duration::from_millis(60)).await;
        assert!(seen.lock().unwrap().is_empty());

        session.load("track").unwrap();
        time::sleep(Duration::from_millis(60)).await;
        assert_eq!(*seen.lock().unwrap(), vec![SessionEvent::Ready]);
    }

    #[test]
    fn test_clones_share_capability_key() {
        let backend = SimulatedMediaBackend::new();
        let other = SimulatedMediaBackend::new();

        assert_eq!(backend.capability_key(), backend.clone().capability_key());
        assert_ne!(backend.capability_key(), other.capability_key());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent_and_rejects_calls() {
        let backend = SimulatedMediaBackend::new();
        let mut session = backend
            .create_session(&MountHandle::default(), SessionEventSink::noop())
            .await
            .unwrap();

        session.dispose();
        session.dispose();

        assert_eq!(backend.session_count(), 1);
        assert_eq!(backend.disposed_count(), 1);
        assert!(matches!(
            session.load("track"),
            Err(BridgeError::SessionDisposed)
        ));
    }

    #[tokio::test]
    async fn test_seek_clamps_to_duration() {
        let config = SimulatedBackendConfig::default()
            .with_duration_for("short", Duration::from_secs(10));
        let backend = SimulatedMediaBackend::with_config(config);
        let mut session = backend
            .create_session(&MountHandle::default(), SessionEventSink::noop())
            .await
            .unwrap();

        session.load("short").unwrap();
        session.seek_to(42.0).unwrap();
        assert_eq!(session.current_time(), 10.0);
        session.seek_to(-3.0).unwrap();
        assert_eq!(session.current_time(), 0.0);
    }
}
