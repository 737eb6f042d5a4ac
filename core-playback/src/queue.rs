//! # Queue & Order Engine
//!
//! Owns the track list, the natural index, the shuffle permutation and the
//! repeat mode, and computes where next/previous/select land under every
//! combination of those.
//!
//! ## Ordering
//!
//! The *natural order* is the catalog order. While shuffle is enabled the
//! *active order* is a permutation of the natural indices whose first element
//! is the track that was playing when the permutation was generated, so
//! enabling shuffle never displaces the current track.
//!
//! ## Boundaries
//!
//! Stepping past either end of the active order wraps only when the repeat
//! mode is [`RepeatMode::All`]; otherwise the position holds. The end-of-track
//! policy in the controller deliberately differs (it resets to the first
//! track and stops), see [`PlaybackController`](crate::controller).
//!
//! No operation here fails. Commands on an empty queue are no-ops and
//! out-of-range selections wrap.

use core_metadata::Track;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What happens at the ends of the queue and at the end of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// The next mode in the fixed cycle `off -> all -> one -> off`.
    pub fn next(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepeatMode::Off => "off",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Build a permutation of `0..n` whose first element is `anchor`.
///
/// The remaining `n - 1` indices are shuffled uniformly (Fisher-Yates) with
/// `rng`, so a seeded source gives an exact, repeatable order. An anchor
/// outside `0..n` is clamped to the last index; `n == 0` yields an empty
/// order.
pub fn generate_shuffle_order<R>(anchor: usize, n: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    if n == 0 {
        return Vec::new();
    }
    let anchor = anchor.min(n - 1);

    let mut rest: Vec<usize> = (0..n).filter(|&i| i != anchor).collect();
    rest.shuffle(rng);

    let mut order = Vec::with_capacity(n);
    order.push(anchor);
    order.extend(rest);
    order
}

/// Queue state plus the operations that mutate it.
pub struct QueueEngine {
    tracks: Arc<Vec<Track>>,
    natural_index: usize,
    repeat_mode: RepeatMode,
    shuffle_enabled: bool,
    /// Empty unless shuffle is enabled and there are tracks.
    shuffle_order: Vec<usize>,
    shuffle_position: usize,
    rng: StdRng,
}

impl QueueEngine {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Engine whose shuffle permutations are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            tracks: Arc::new(Vec::new()),
            natural_index: 0,
            repeat_mode: RepeatMode::Off,
            shuffle_enabled: false,
            shuffle_order: Vec::new(),
            shuffle_position: 0,
            rng,
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn tracks(&self) -> &Arc<Vec<Track>> {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track at the natural index, `None` when the queue is empty.
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.natural_index)
    }

    pub fn natural_index(&self) -> usize {
        self.natural_index
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn is_shuffling(&self) -> bool {
        self.shuffle_enabled
    }

    pub fn shuffle_order(&self) -> &[usize] {
        &self.shuffle_order
    }

    /// The order driving next/previous: the shuffle permutation while
    /// shuffling, the natural order otherwise.
    pub fn active_order(&self) -> Vec<usize> {
        if self.shuffle_enabled && !self.shuffle_order.is_empty() {
            self.shuffle_order.clone()
        } else {
            (0..self.tracks.len()).collect()
        }
    }

    /// Position of the current track within [`active_order`](Self::active_order).
    pub fn queue_position(&self) -> usize {
        if self.shuffle_enabled {
            self.shuffle_position
        } else {
            self.natural_index
        }
    }

    pub fn is_last_in_natural_order(&self) -> bool {
        !self.tracks.is_empty() && self.natural_index == self.tracks.len() - 1
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Replace the track list and go back to the first track.
    ///
    /// Any previous shuffle order is dropped. If shuffle is still enabled a
    /// fresh order anchored at index 0 is generated for the new list.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = Arc::new(tracks);
        self.natural_index = 0;
        self.shuffle_order.clear();
        self.shuffle_position = 0;

        if self.shuffle_enabled {
            self.regenerate_order(0);
        }
        debug!(tracks = self.tracks.len(), "Queue tracks replaced");
    }

    /// Step through the active order. Returns `true` if the index moved.
    pub fn advance(&mut self, direction: Direction) -> bool {
        let n = self.tracks.len();
        if n == 0 {
            return false;
        }

        if self.shuffle_enabled {
            if self.shuffle_order.len() != n {
                self.regenerate_order(self.natural_index);
            }
            let Some(position) = self.step(self.shuffle_position, n, direction) else {
                return false;
            };
            self.shuffle_position = position;
            self.natural_index = self.shuffle_order[position];
        } else {
            let Some(index) = self.step(self.natural_index, n, direction) else {
                return false;
            };
            self.natural_index = index;
        }

        debug!(
            index = self.natural_index,
            position = self.queue_position(),
            repeat_mode = %self.repeat_mode,
            "Queue advanced"
        );
        true
    }

    /// Jump to `index`, wrapped into range so negative and oversized values
    /// are accepted.
    pub fn select_track(&mut self, index: i64) {
        let n = self.tracks.len();
        if n == 0 {
            return;
        }

        let normalized = index.rem_euclid(n as i64) as usize;
        self.natural_index = normalized;

        if self.shuffle_enabled {
            match self.shuffle_order.iter().position(|&i| i == normalized) {
                Some(position) => self.shuffle_position = position,
                None => self.regenerate_order(normalized),
            }
        }
        debug!(requested = index, index = normalized, "Track selected");
    }

    /// Flip shuffle. Turning it on anchors a fresh order at the current
    /// track; turning it off keeps the current track.
    pub fn toggle_shuffle(&mut self) {
        self.shuffle_enabled = !self.shuffle_enabled;
        self.shuffle_order.clear();
        self.shuffle_position = 0;

        if self.shuffle_enabled && !self.tracks.is_empty() {
            self.regenerate_order(self.natural_index);
        }
        debug!(enabled = self.shuffle_enabled, "Shuffle toggled");
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.next();
        debug!(repeat_mode = %self.repeat_mode, "Repeat mode changed");
        self.repeat_mode
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    /// Next position over `0..len`, `None` when holding at a boundary.
    fn step(&self, from: usize, len: usize, direction: Direction) -> Option<usize> {
        let wrap = self.repeat_mode == RepeatMode::All;
        match direction {
            Direction::Forward if from + 1 < len => Some(from + 1),
            Direction::Forward => wrap.then_some(0),
            Direction::Backward if from > 0 => Some(from - 1),
            Direction::Backward => wrap.then_some(len - 1),
        }
    }

    fn regenerate_order(&mut self, anchor: usize) {
        self.shuffle_order = generate_shuffle_order(anchor, self.tracks.len(), &mut self.rng);
        self.shuffle_position = 0;
    }
}

impl Default for QueueEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueueEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueEngine")
            .field("tracks", &self.tracks.len())
            .field("natural_index", &self.natural_index)
            .field("repeat_mode", &self.repeat_mode)
            .field("shuffle_enabled", &self.shuffle_enabled)
            .field("shuffle_order", &self.shuffle_order)
            .field("shuffle_position", &self.shuffle_position)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn tracks(n: u32) -> Vec<Track> {
        (1..=n)
            .map(|id| Track::fallback(id, format!("src-{id}")))
            .collect()
    }

    fn engine(n: u32) -> QueueEngine {
        let mut engine = QueueEngine::with_seed(7);
        engine.set_tracks(tracks(n));
        engine
    }

    #[test]
    fn shuffle_order_is_anchored_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 1..12 {
            for anchor in 0..n {
                let order = generate_shuffle_order(anchor, n, &mut rng);
                assert_eq!(order[0], anchor);
                let mut sorted = order.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn shuffle_order_with_fixed_source_is_exact() {
        // A source that always draws zero swaps each slot with the first.
        let mut rng = StepRng::new(0, 0);
        assert_eq!(generate_shuffle_order(1, 4, &mut rng), vec![1, 2, 3, 0]);
    }

    #[test]
    fn shuffle_order_edge_sizes() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate_shuffle_order(0, 0, &mut rng).is_empty());
        assert_eq!(generate_shuffle_order(0, 1, &mut rng), vec![0]);
        assert_eq!(generate_shuffle_order(9, 3, &mut rng)[0], 2);
    }

    #[test]
    fn same_seed_same_order() {
        let mut a = engine(8);
        let mut b = engine(8);
        a.toggle_shuffle();
        b.toggle_shuffle();
        assert_eq!(a.shuffle_order(), b.shuffle_order());
    }

    #[test]
    fn empty_queue_is_inert() {
        let mut engine = QueueEngine::with_seed(1);
        assert!(engine.current_track().is_none());
        assert!(!engine.advance(Direction::Forward));
        engine.select_track(5);
        engine.toggle_shuffle();
        assert!(engine.is_shuffling());
        assert!(engine.shuffle_order().is_empty());
        assert!(engine.active_order().is_empty());
        assert_eq!(engine.natural_index(), 0);
    }

    #[test]
    fn set_tracks_resets_index_and_reshuffles_when_enabled() {
        let mut engine = engine(5);
        engine.select_track(3);
        engine.toggle_shuffle();
        assert_eq!(engine.shuffle_order()[0], 3);

        engine.set_tracks(tracks(4));
        assert_eq!(engine.natural_index(), 0);
        assert_eq!(engine.queue_position(), 0);
        assert_eq!(engine.shuffle_order().len(), 4);
        assert_eq!(engine.shuffle_order()[0], 0);
    }

    #[test]
    fn cycle_repeat_mode_returns_to_off() {
        let mut engine = engine(1);
        assert_eq!(engine.cycle_repeat_mode(), RepeatMode::All);
        assert_eq!(engine.cycle_repeat_mode(), RepeatMode::One);
        assert_eq!(engine.cycle_repeat_mode(), RepeatMode::Off);
    }

    #[test]
    fn repeat_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RepeatMode::All).unwrap(), "\"all\"");
        assert_eq!(RepeatMode::One.to_string(), "one");
    }
}
