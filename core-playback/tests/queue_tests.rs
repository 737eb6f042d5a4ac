//! Queue engine behaviour across shuffle and repeat combinations.

use core_metadata::Track;
use core_playback::{generate_shuffle_order, Direction, QueueEngine, RepeatMode};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn tracks(n: u32) -> Vec<Track> {
    (1..=n)
        .map(|id| Track::fallback(id, format!("https://youtu.be/{id}")))
        .collect()
}

fn queue(n: u32) -> QueueEngine {
    let mut queue = QueueEngine::with_seed(2024);
    queue.set_tracks(tracks(n));
    queue
}

fn set_repeat(queue: &mut QueueEngine, mode: RepeatMode) {
    while queue.repeat_mode() != mode {
        queue.cycle_repeat_mode();
    }
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    sorted == (0..n).collect::<Vec<_>>()
}

// ============================================================================
// Linear order
// ============================================================================

#[test]
fn test_forward_holds_at_end_without_repeat() {
    let mut queue = queue(3);
    queue.select_track(2);

    assert!(!queue.advance(Direction::Forward));
    assert_eq!(queue.natural_index(), 2);
}

#[test]
fn test_forward_wraps_with_repeat_all() {
    let mut queue = queue(3);
    set_repeat(&mut queue, RepeatMode::All);
    queue.select_track(2);

    assert!(queue.advance(Direction::Forward));
    assert_eq!(queue.natural_index(), 0);
}

#[test]
fn test_backward_holds_at_start_unless_repeat_all() {
    let mut queue = queue(3);
    assert!(!queue.advance(Direction::Backward));
    assert_eq!(queue.natural_index(), 0);

    set_repeat(&mut queue, RepeatMode::All);
    assert!(queue.advance(Direction::Backward));
    assert_eq!(queue.natural_index(), 2);
}

#[test]
fn test_repeat_one_does_not_wrap_manual_steps() {
    let mut queue = queue(3);
    set_repeat(&mut queue, RepeatMode::One);
    queue.select_track(2);

    assert!(!queue.advance(Direction::Forward));
    assert_eq!(queue.natural_index(), 2);
}

#[test]
fn test_select_track_wraps_any_integer() {
    let mut queue = queue(4);
    for i in -13i64..=13 {
        queue.select_track(i);
        assert_eq!(queue.natural_index() as i64, ((i % 4) + 4) % 4, "index {i}");
    }

    queue.select_track(i64::MIN);
    assert!(queue.natural_index() < 4);
}

#[test]
fn test_current_track_follows_index() {
    let mut queue = queue(3);
    assert_eq!(queue.current_track().map(|t| t.id), Some(1));
    queue.advance(Direction::Forward);
    assert_eq!(queue.current_track().map(|t| t.id), Some(2));
    assert!(!queue.is_last_in_natural_order());
    queue.advance(Direction::Forward);
    assert!(queue.is_last_in_natural_order());
}

// ============================================================================
// Shuffled order
// ============================================================================

#[test]
fn test_enabling_shuffle_anchors_current_track() {
    let mut queue = queue(4);
    queue.select_track(1);
    queue.toggle_shuffle();

    assert!(queue.is_shuffling());
    assert_eq!(queue.shuffle_order()[0], 1);
    assert_eq!(queue.queue_position(), 0);
    assert!(is_permutation(queue.shuffle_order(), 4));
    assert_eq!(queue.natural_index(), 1);
}

#[test]
fn test_disabling_shuffle_keeps_current_track() {
    let mut queue = queue(5);
    queue.toggle_shuffle();
    queue.advance(Direction::Forward);
    queue.advance(Direction::Forward);
    let playing = queue.natural_index();

    queue.toggle_shuffle();

    assert!(!queue.is_shuffling());
    assert!(queue.shuffle_order().is_empty());
    assert_eq!(queue.natural_index(), playing);
    assert_eq!(queue.queue_position(), playing);
    assert_eq!(queue.active_order(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_shuffled_walk_visits_every_track_once() {
    let mut queue = queue(6);
    queue.toggle_shuffle();
    let order = queue.active_order();

    let mut visited = vec![queue.natural_index()];
    while queue.advance(Direction::Forward) {
        visited.push(queue.natural_index());
    }

    assert_eq!(visited, order);
    assert_eq!(queue.queue_position(), 5);
}

#[test]
fn test_shuffled_boundaries_follow_repeat_mode() {
    let mut queue = queue(4);
    queue.toggle_shuffle();
    let order = queue.active_order();

    assert!(!queue.advance(Direction::Backward));
    assert_eq!(queue.queue_position(), 0);

    set_repeat(&mut queue, RepeatMode::All);
    assert!(queue.advance(Direction::Backward));
    assert_eq!(queue.queue_position(), 3);
    assert_eq!(queue.natural_index(), order[3]);

    assert!(queue.advance(Direction::Forward));
    assert_eq!(queue.queue_position(), 0);
    assert_eq!(queue.natural_index(), order[0]);
}

#[test]
fn test_select_while_shuffling_moves_position() {
    let mut queue = queue(5);
    queue.toggle_shuffle();
    let order = queue.active_order();

    queue.select_track(order[3] as i64);

    assert_eq!(queue.queue_position(), 3);
    assert_eq!(queue.natural_index(), order[3]);
    assert_eq!(queue.active_order(), order);
}

#[test]
fn test_shuffle_invariant_holds_under_mixed_operations() {
    let mut queue = queue(7);
    let ops: [fn(&mut QueueEngine); 6] = [
        |q| {
            q.advance(Direction::Forward);
        },
        |q| {
            q.advance(Direction::Backward);
        },
        |q| q.select_track(-3),
        |q| q.toggle_shuffle(),
        |q| {
            q.cycle_repeat_mode();
        },
        |q| q.select_track(11),
    ];

    for step in 0..200 {
        ops[(step * 7 + step / 3) % ops.len()](&mut queue);

        assert!(queue.natural_index() < 7);
        if queue.is_shuffling() {
            let order = queue.shuffle_order();
            assert!(is_permutation(order, 7));
            assert_eq!(order[queue.queue_position()], queue.natural_index());
        }
    }
}

#[test]
fn test_seeded_engines_agree() {
    let mut a = QueueEngine::with_seed(99);
    let mut b = QueueEngine::with_seed(99);
    a.set_tracks(tracks(10));
    b.set_tracks(tracks(10));
    a.toggle_shuffle();
    b.toggle_shuffle();

    assert_eq!(a.shuffle_order(), b.shuffle_order());
}

#[test]
fn test_generate_shuffle_order_is_anchored_permutation() {
    let mut rng = StdRng::seed_from_u64(5);
    for n in 1..=20 {
        for anchor in 0..n {
            let order = generate_shuffle_order(anchor, n, &mut rng);
            assert_eq!(order.len(), n);
            assert_eq!(order[0], anchor);
            assert!(is_permutation(&order, n));
        }
    }
}

// ============================================================================
// Empty queue
// ============================================================================

#[test]
fn test_empty_queue_commands_are_noops() {
    let mut queue = QueueEngine::with_seed(1);
    queue.set_tracks(Vec::new());

    assert!(!queue.advance(Direction::Forward));
    assert!(!queue.advance(Direction::Backward));
    queue.select_track(-1);

    assert!(queue.current_track().is_none());
    assert_eq!(queue.natural_index(), 0);
    assert!(!queue.is_last_in_natural_order());
}
