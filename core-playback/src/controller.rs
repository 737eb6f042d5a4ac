//! # Playback Controller
//!
//! Mediates between the [`QueueEngine`] and a media backend session.
//!
//! ## Model
//!
//! The controller is a single task that owns the queue, the play/pause
//! intent, the one live session and the position poll timer. Player
//! commands, session signals, session-creation completions and unmute timers
//! all arrive as messages on one channel and are handled one at a time.
//! Hosts talk to it through a [`PlayerHandle`] and observe it through
//! [`PlayerSnapshot`]s.
//!
//! ## Session lifecycle
//!
//! ```text
//! Idle --(first play)--> Loading --(Ready)--> Ready --(teardown)--> Disposed
//! ```
//!
//! The session is created on the first play intent and reused for every
//! later track by loading the new source into it. Intent set before the
//! session is ready is applied once when `Ready` arrives.
//!
//! [`SessionPhase`] follows the session, not the item. Backends signal
//! `Ready` only after the first load, so a track change on a ready session
//! stays `Ready` and the intent is applied to the new item at once.
//!
//! A source the session refuses to load is logged and skipped over: the
//! intent is kept and the previous item paused until the next track change.
//!
//! ## End of track
//!
//! | Repeat | Position | Result |
//! |---|---|---|
//! | one | any | seek to 0, keep playing |
//! | all | any | advance forward (wraps) |
//! | off | not last | advance forward |
//! | off | last | select track 0 and stop |
//!
//! The last row intentionally differs from manual next/previous, which hold
//! at the boundary when repeat is off.
//!
//! ## Liveness
//!
//! Session creation runs in a spawned task. Its result carries the
//! [`SessionId`] it was started for and is discarded (the session disposed)
//! unless that id is still pending and the controller has not been torn
//! down.

use crate::capability::BackendCapability;
use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::queue::{Direction, QueueEngine, RepeatMode};
use bridge_traits::media::{MediaSession, MountHandle, SessionEvent, SessionEventSink, SessionId};
use core_async::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use core_async::sync::{oneshot, watch, CancellationToken};
use core_async::time::{self, Interval};
use core_metadata::Track;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Commands accepted from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    TogglePlay,
    Next,
    Previous,
    /// Any integer; wrapped into range.
    SelectTrack(i64),
    ToggleShuffle,
    CycleRepeatMode,
    /// Absolute position in seconds.
    SeekTo(f64),
    SetTracks(Vec<Track>),
}

/// Where the current session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session yet (or creation failed).
    #[default]
    Idle,
    /// Session requested or created, first load not finished.
    Loading,
    /// Session ready; stays so across later track loads.
    Ready,
    Disposed,
}

/// Observable player state, published after every change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub tracks: Arc<Vec<Track>>,
    pub current_track: Option<Track>,
    pub current_index: usize,
    /// Active order: the shuffle permutation or the natural order.
    pub queue_order: Vec<usize>,
    pub queue_position: usize,
    /// The play intent, independent of whether the backend is ready.
    pub is_playing: bool,
    pub is_shuffling: bool,
    pub repeat_mode: RepeatMode,
    /// Seconds.
    pub current_time: f64,
    /// Seconds, 0 when unknown.
    pub duration: f64,
    pub phase: SessionPhase,
    /// `false` once the backend failed to initialize.
    pub backend_available: bool,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            tracks: Arc::new(Vec::new()),
            current_track: None,
            current_index: 0,
            queue_order: Vec::new(),
            queue_position: 0,
            is_playing: false,
            is_shuffling: false,
            repeat_mode: RepeatMode::Off,
            current_time: 0.0,
            duration: 0.0,
            phase: SessionPhase::Idle,
            backend_available: true,
        }
    }
}

enum ControllerMessage {
    Command(PlayerCommand),
    Session {
        id: SessionId,
        event: SessionEvent,
    },
    SessionCreated {
        id: SessionId,
        result: Result<Box<dyn MediaSession>>,
    },
    Unmute(SessionId),
    Shutdown(oneshot::Sender<()>),
}

/// Builder for the controller task.
pub struct PlaybackController {
    capability: Arc<BackendCapability>,
    mount: MountHandle,
    config: PlaybackConfig,
    event_bus: Option<EventBus>,
    queue: QueueEngine,
}

impl PlaybackController {
    pub fn new(capability: Arc<BackendCapability>, mount: MountHandle, config: PlaybackConfig) -> Self {
        Self {
            capability,
            mount,
            config,
            event_bus: None,
            queue: QueueEngine::new(),
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Start from a prepared queue (e.g. one with a seeded shuffle source).
    pub fn with_queue(mut self, queue: QueueEngine) -> Self {
        self.queue = queue;
        self
    }

    /// Spawn the controller task.
    ///
    /// The task stops on [`PlayerHandle::shutdown`] or once every handle is
    /// dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a runtime context.
    pub fn spawn(self) -> PlayerHandle {
        let (commands, messages) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(PlayerSnapshot::default());

        let task = ControllerTask {
            capability: self.capability,
            mount: self.mount,
            config: self.config,
            event_bus: self.event_bus,
            queue: self.queue,
            desired_playing: false,
            session: None,
            pending: None,
            backend_available: true,
            phase: SessionPhase::Idle,
            current_time: 0.0,
            duration: 0.0,
            poll: None,
            messages: commands.downgrade(),
            liveness: CancellationToken::new(),
            snapshot_tx,
        };
        task.publish();

        core_async::spawn(task.run(messages));

        PlayerHandle { commands, snapshot }
    }
}

/// Cloneable handle to a running controller.
///
/// Commands are fire-and-forget: they never fail and never block. Commands
/// sent after shutdown are dropped.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: UnboundedSender<ControllerMessage>,
    snapshot: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    pub fn play(&self) {
        self.dispatch(PlayerCommand::Play);
    }

    pub fn pause(&self) {
        self.dispatch(PlayerCommand::Pause);
    }

    pub fn toggle_play(&self) {
        self.dispatch(PlayerCommand::TogglePlay);
    }

    pub fn next(&self) {
        self.dispatch(PlayerCommand::Next);
    }

    pub fn previous(&self) {
        self.dispatch(PlayerCommand::Previous);
    }

    pub fn select_track(&self, index: i64) {
        self.dispatch(PlayerCommand::SelectTrack(index));
    }

    pub fn toggle_shuffle(&self) {
        self.dispatch(PlayerCommand::ToggleShuffle);
    }

    pub fn cycle_repeat_mode(&self) {
        self.dispatch(PlayerCommand::CycleRepeatMode);
    }

    pub fn seek_to(&self, seconds: f64) {
        self.dispatch(PlayerCommand::SeekTo(seconds));
    }

    pub fn set_tracks(&self, tracks: Vec<Track>) {
        self.dispatch(PlayerCommand::SetTracks(tracks));
    }

    /// Send a command, reporting whether the controller is still running.
    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(ControllerMessage::Command(command))
            .map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Stop the controller and wait until its session is disposed.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(ControllerMessage::Shutdown(ack)).is_ok() {
            done.await.ok();
        }
    }

    fn dispatch(&self, command: PlayerCommand) {
        if let Err(e) = self.send(command) {
            debug!(error = %e, "Dropping player command");
        }
    }
}

struct ActiveSession {
    id: SessionId,
    session: Box<dyn MediaSession>,
    ready: bool,
}

enum PlayOutcome {
    Direct,
    Muted,
    Failed(PlaybackError),
}

struct ControllerTask {
    capability: Arc<BackendCapability>,
    mount: MountHandle,
    config: PlaybackConfig,
    event_bus: Option<EventBus>,
    queue: QueueEngine,

    desired_playing: bool,
    session: Option<ActiveSession>,
    /// Session whose creation is in flight.
    pending: Option<SessionId>,
    backend_available: bool,
    phase: SessionPhase,
    current_time: f64,
    duration: f64,
    poll: Option<Interval>,

    messages: WeakUnboundedSender<ControllerMessage>,
    liveness: CancellationToken,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
}

impl ControllerTask {
    async fn run(mut self, mut messages: UnboundedReceiver<ControllerMessage>) {
        info!("Playback controller started");
        let liveness = self.liveness.clone();

        loop {
            core_async::select! {
                _ = liveness.cancelled() => break,
                message = messages.recv() => match message {
                    Some(message) => {
                        if !self.handle(message) {
                            return;
                        }
                    }
                    None => break,
                },
                _ = next_tick(&mut self.poll) => self.sample_time(),
            }
            self.publish();
        }

        self.teardown();
    }

    /// Returns `false` once the controller should stop.
    fn handle(&mut self, message: ControllerMessage) -> bool {
        match message {
            ControllerMessage::Command(command) => self.handle_command(command),
            ControllerMessage::Session { id, event } => self.handle_session_event(id, event),
            ControllerMessage::SessionCreated { id, result } => {
                self.handle_session_created(id, result)
            }
            ControllerMessage::Unmute(id) => self.handle_unmute(id),
            ControllerMessage::Shutdown(ack) => {
                self.teardown();
                ack.send(()).ok();
                return false;
            }
        }
        true
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    fn handle_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play => self.set_intent(true),
            PlayerCommand::Pause => self.set_intent(false),
            PlayerCommand::TogglePlay => self.set_intent(!self.desired_playing),
            PlayerCommand::Next => self.step(Direction::Forward),
            PlayerCommand::Previous => self.step(Direction::Backward),
            PlayerCommand::SelectTrack(index) => {
                let before = (self.queue.natural_index(), self.current_track_id());
                self.queue.select_track(index);
                if (self.queue.natural_index(), self.current_track_id()) != before {
                    self.on_track_changed();
                }
            }
            PlayerCommand::ToggleShuffle => self.queue.toggle_shuffle(),
            PlayerCommand::CycleRepeatMode => {
                self.queue.cycle_repeat_mode();
            }
            PlayerCommand::SeekTo(seconds) => self.seek(seconds),
            PlayerCommand::SetTracks(tracks) => {
                self.queue.set_tracks(tracks);
                if self.queue.is_empty() {
                    self.desired_playing = false;
                    self.current_time = 0.0;
                    self.duration = 0.0;
                    self.apply_pause();
                } else {
                    self.on_track_changed();
                }
            }
        }
    }

    fn set_intent(&mut self, playing: bool) {
        if !self.backend_available {
            debug!("Media backend unavailable, ignoring transport command");
            return;
        }
        if self.queue.is_empty() {
            debug!("Queue is empty, ignoring transport command");
            return;
        }

        self.desired_playing = playing;
        if playing {
            self.ensure_session();
        }
        self.apply_intent();
    }

    fn step(&mut self, direction: Direction) {
        if self.queue.advance(direction) {
            self.on_track_changed();
        }
    }

    fn seek(&mut self, seconds: f64) {
        match self.session.as_mut().filter(|active| active.ready) {
            Some(active) => match active.session.seek_to(seconds) {
                Ok(()) => self.current_time = active.session.current_time(),
                Err(e) => debug!(session_id = %active.id, error = %e, "Seek failed"),
            },
            None => debug!(seconds, "No ready session, ignoring seek"),
        }
    }

    fn on_track_changed(&mut self) {
        let Some(track) = self.queue.current_track().cloned() else {
            return;
        };
        let index = self.queue.natural_index();
        self.current_time = 0.0;
        self.duration = 0.0;

        info!(index, track_id = track.id, "Current track changed");
        self.emit(PlaybackEvent::TrackChanged {
            index,
            track_id: track.id,
        });

        if let Some(active) = self.session.as_mut() {
            match active.session.load(&track.source_ref) {
                Ok(()) => self.apply_intent(),
                Err(e) => {
                    // Hold: keep the intent, stop the previous item.
                    warn!(session_id = %active.id, track_id = track.id, error = %e, "Failed to load track");
                    if active.ready {
                        active.session.pause().ok();
                    }
                }
            }
        } else if self.desired_playing {
            self.ensure_session();
        }
    }

    // ------------------------------------------------------------------------
    // Intent
    // ------------------------------------------------------------------------

    /// Push the play/pause intent to the session if it is ready.
    fn apply_intent(&mut self) {
        if self.desired_playing {
            self.apply_play();
        } else {
            self.apply_pause();
        }
    }

    fn apply_play(&mut self) {
        let Some(track_id) = self.current_track_id() else {
            return;
        };
        let Some(active) = self.session.as_mut().filter(|active| active.ready) else {
            return;
        };
        let id = active.id;

        match play_with_fallback(active.session.as_mut()) {
            PlayOutcome::Direct => {
                debug!(session_id = %id, track_id, "Playing");
                self.emit(PlaybackEvent::Started { track_id });
            }
            PlayOutcome::Muted => {
                warn!(session_id = %id, track_id, "Autoplay rejected, playing muted");
                self.emit(PlaybackEvent::AutoplayFallback {
                    session_id: id.to_string(),
                });
                self.emit(PlaybackEvent::Started { track_id });
                self.schedule_unmute(id);
            }
            PlayOutcome::Failed(e) => {
                warn!(session_id = %id, track_id, error = %e, "Muted playback also failed");
            }
        }
    }

    fn apply_pause(&mut self) {
        let track_id = self.current_track_id();
        let Some(active) = self.session.as_mut().filter(|active| active.ready) else {
            return;
        };

        if let Err(e) = active.session.pause() {
            debug!(session_id = %active.id, error = %e, "Pause failed");
            return;
        }
        if let Some(track_id) = track_id {
            self.emit(PlaybackEvent::Paused { track_id });
        }
    }

    fn schedule_unmute(&self, id: SessionId) {
        let delay = self.config.unmute_delay;
        let messages = self.messages.clone();
        let liveness = self.liveness.clone();

        core_async::spawn(async move {
            core_async::select! {
                _ = liveness.cancelled() => {}
                _ = time::sleep(delay) => {
                    if let Some(tx) = messages.upgrade() {
                        tx.send(ControllerMessage::Unmute(id)).ok();
                    }
                }
            }
        });
    }

    fn handle_unmute(&mut self, id: SessionId) {
        let Some(active) = self
            .session
            .as_mut()
            .filter(|active| active.id == id && active.ready)
        else {
            debug!(session_id = %id, "Dropping unmute for inactive session");
            return;
        };

        match active.session.unmute() {
            Ok(()) => debug!(session_id = %id, "Unmuted after autoplay fallback"),
            Err(e) => debug!(session_id = %id, error = %e, "Unmute failed"),
        }
    }

    // ------------------------------------------------------------------------
    // Session lifecycle
    // ------------------------------------------------------------------------

    fn ensure_session(&mut self) {
        if self.session.is_some() || self.pending.is_some() || !self.backend_available {
            return;
        }

        let id = SessionId::new();
        self.pending = Some(id);
        self.phase = SessionPhase::Loading;
        debug!(session_id = %id, "Creating media session");

        let capability = Arc::clone(&self.capability);
        let mount = self.mount.clone();
        let events = self.session_sink(id);
        let messages = self.messages.clone();
        let liveness = self.liveness.clone();

        core_async::spawn(async move {
            let result = match capability.ensure_ready().await {
                Ok(()) => capability
                    .backend()
                    .create_session(&mount, events)
                    .await
                    .map_err(PlaybackError::from),
                Err(e) => Err(e),
            };
            deliver_created_session(id, result, &messages, &liveness);
        });
    }

    /// Sink that tags every signal with `id`.
    fn session_sink(&self, id: SessionId) -> SessionEventSink {
        let messages = self.messages.clone();
        SessionEventSink::new(move |event| {
            if let Some(tx) = messages.upgrade() {
                tx.send(ControllerMessage::Session { id, event }).ok();
            }
        })
    }

    fn accept_creation(&self, id: SessionId) -> Result<()> {
        if self.pending == Some(id) && !self.liveness.is_cancelled() {
            Ok(())
        } else {
            Err(PlaybackError::StaleCompletion)
        }
    }

    fn handle_session_created(&mut self, id: SessionId, result: Result<Box<dyn MediaSession>>) {
        if let Err(e) = self.accept_creation(id) {
            if let Ok(mut session) = result {
                session.dispose();
            }
            debug!(session_id = %id, error = %e, "Discarding session");
            return;
        }
        self.pending = None;

        match result {
            Ok(mut session) => {
                if let Some(track) = self.queue.current_track() {
                    if let Err(e) = session.load(&track.source_ref) {
                        warn!(session_id = %id, track_id = track.id, error = %e, "Failed to load track");
                    }
                }
                info!(session_id = %id, "Media session created");
                self.session = Some(ActiveSession {
                    id,
                    session,
                    ready: false,
                });
            }
            Err(PlaybackError::BackendUnavailable(reason)) => {
                warn!(reason = %reason, "Media backend unavailable, playback disabled");
                self.backend_available = false;
                self.desired_playing = false;
                self.phase = SessionPhase::Idle;
                self.emit(PlaybackEvent::BackendUnavailable { reason });
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "Failed to create media session");
                self.desired_playing = false;
                self.phase = SessionPhase::Idle;
            }
        }
    }

    fn handle_session_event(&mut self, id: SessionId, event: SessionEvent) {
        let is_current = self.session.as_ref().is_some_and(|active| active.id == id);
        if !is_current {
            debug!(session_id = %id, ?event, "Ignoring event from inactive session");
            return;
        }

        match event {
            SessionEvent::Ready => self.on_ready(),
            SessionEvent::Ended => self.on_ended(),
        }
    }

    fn on_ready(&mut self) {
        let Some(active) = self.session.as_mut() else {
            return;
        };
        if active.ready {
            return;
        }
        active.ready = true;
        let id = active.id;

        self.phase = SessionPhase::Ready;
        info!(session_id = %id, "Media session ready");
        self.emit(PlaybackEvent::SessionReady {
            session_id: id.to_string(),
        });

        self.apply_intent();
        self.poll = Some(time::polling_interval(self.config.poll_interval));
        self.sample_time();
    }

    fn on_ended(&mut self) {
        let Some(track_id) = self.current_track_id() else {
            return;
        };
        let repeat_mode = self.queue.repeat_mode();
        debug!(track_id, repeat_mode = %repeat_mode, "Track ended");
        self.emit(PlaybackEvent::Ended { track_id });

        match repeat_mode {
            RepeatMode::One => {
                if let Some(active) = self.session.as_mut() {
                    if let Err(e) = active.session.seek_to(0.0) {
                        debug!(session_id = %active.id, error = %e, "Seek to start failed");
                    }
                }
                self.current_time = 0.0;
                self.desired_playing = true;
                self.apply_play();
            }
            RepeatMode::All => self.step(Direction::Forward),
            RepeatMode::Off if !self.queue.is_last_in_natural_order() => {
                self.step(Direction::Forward)
            }
            RepeatMode::Off => {
                self.queue.select_track(0);
                self.desired_playing = false;
                self.on_track_changed();
            }
        }
    }

    fn sample_time(&mut self) {
        if let Some(active) = self.session.as_ref().filter(|active| active.ready) {
            self.current_time = active.session.current_time();
            self.duration = active.session.duration();
        }
    }

    fn teardown(&mut self) {
        if self.phase == SessionPhase::Disposed {
            return;
        }

        self.liveness.cancel();
        self.poll = None;
        self.pending = None;
        if let Some(mut active) = self.session.take() {
            active.session.dispose();
            debug!(session_id = %active.id, "Media session disposed");
        }
        self.desired_playing = false;
        self.phase = SessionPhase::Disposed;

        self.publish();
        self.emit(PlaybackEvent::Stopped);
        info!("Playback controller stopped");
    }

    // ------------------------------------------------------------------------
    // Publishing
    // ------------------------------------------------------------------------

    fn current_track_id(&self) -> Option<u32> {
        self.queue.current_track().map(|track| track.id)
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            tracks: Arc::clone(self.queue.tracks()),
            current_track: self.queue.current_track().cloned(),
            current_index: self.queue.natural_index(),
            queue_order: self.queue.active_order(),
            queue_position: self.queue.queue_position(),
            is_playing: self.desired_playing,
            is_shuffling: self.queue.is_shuffling(),
            repeat_mode: self.queue.repeat_mode(),
            current_time: self.current_time,
            duration: self.duration,
            phase: self.phase,
            backend_available: self.backend_available,
        }
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Playback(event)).ok();
        }
    }
}

/// Direct play, then mute and retry once.
fn play_with_fallback(session: &mut dyn MediaSession) -> PlayOutcome {
    let Err(rejected) = session.play() else {
        return PlayOutcome::Direct;
    };
    debug!(error = %rejected, "Direct play rejected, retrying muted");

    if let Err(e) = session.mute() {
        return PlayOutcome::Failed(e.into());
    }
    match session.play() {
        Ok(()) => PlayOutcome::Muted,
        Err(e) => {
            debug!(error = %e, "Muted play rejected");
            PlayOutcome::Failed(PlaybackError::AutoplayRejected)
        }
    }
}

/// Hand a finished creation back to the controller, or dispose the session
/// if nobody is left to take it.
fn deliver_created_session(
    id: SessionId,
    result: Result<Box<dyn MediaSession>>,
    messages: &WeakUnboundedSender<ControllerMessage>,
    liveness: &CancellationToken,
) {
    let message = ControllerMessage::SessionCreated { id, result };
    let undelivered = if liveness.is_cancelled() {
        Some(message)
    } else {
        match messages.upgrade() {
            Some(tx) => tx.send(message).err().map(|e| e.0),
            None => Some(message),
        }
    };

    if let Some(ControllerMessage::SessionCreated {
        result: Ok(mut session),
        ..
    }) = undelivered
    {
        debug!(session_id = %id, "Controller stopped, disposing late session");
        session.dispose();
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
