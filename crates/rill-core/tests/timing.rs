//! Time-dependent operators, checked both on paused tokio time and on a
//! manually stepped virtual clock.

use rill_core::prelude::*;
use rill_testkit::{engine_with_clock, poll_signal, VirtualClock};
use std::time::Duration;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn numbers_and_words() -> Sequence<&'static str> {
    let numbers = Sequence::from_values(["1", "2", "3"]).delay_elements(ms(500));
    let words = Sequence::from_values(["one", "two", "three"])
        .delay_subscription(ms(250))
        .delay_elements(ms(500));
    numbers.merge_with(words)
}

/// Drive `subscription` to its end, jumping the clock to the next deadline
/// whenever nothing is ready. Records the clock reading of every signal.
fn drain_stepping<T>(
    clock: &VirtualClock,
    subscription: &mut Subscription<T>,
) -> Vec<(Duration, Signal<T>)> {
    let mut seen = Vec::new();
    loop {
        match poll_signal(subscription) {
            Some(Some(signal)) => {
                let terminal = signal.is_terminal();
                seen.push((clock.now(), signal));
                if terminal {
                    return seen;
                }
            }
            Some(None) => return seen,
            None => assert!(clock.advance_to_next(), "stalled with no pending timer"),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_interval_take_five_on_paused_time() {
    let engine = SequenceEngine::default();
    let start = engine.clock().now();
    let ticks = Sequence::interval(Duration::from_secs(1)).unwrap().take(5);

    let values = ticks.subscribe(&engine).collect_values().await.unwrap();

    assert_eq!(values, [0, 1, 2, 3, 4]);
    assert!(engine.clock().now() - start >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_merge_interleaves_by_arrival_on_paused_time() {
    let engine = SequenceEngine::default();
    let values = numbers_and_words()
        .subscribe(&engine)
        .collect_values()
        .await
        .unwrap();
    assert_eq!(values, ["1", "one", "2", "two", "3", "three"]);
}

#[tokio::test(start_paused = true)]
async fn test_first_with_signal_mirrors_fast_candidate() {
    let engine = SequenceEngine::default();
    let slow = Sequence::from_values(["a", "b", "c"]).delay_subscription(ms(100));
    let fast = Sequence::from_values(["1", "2", "3"]);

    let first = Sequence::first_with_signal([slow, fast]);
    let values = first.subscribe(&engine).collect_values().await.unwrap();

    assert_eq!(values, ["1", "2", "3"]);
}

#[test]
fn test_interval_steps_one_period_at_a_time() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let mut ticks = Sequence::interval(Duration::from_secs(1))
        .unwrap()
        .take(5)
        .subscribe(&engine);

    for expected in 0..5u64 {
        assert_eq!(poll_signal(&mut ticks), None);
        assert_eq!(clock.pending_timers(), 1);
        clock.advance(Duration::from_secs(1));
        assert_eq!(poll_signal(&mut ticks), Some(Some(Signal::Next(expected))));
    }

    assert_eq!(poll_signal(&mut ticks), Some(Some(Signal::Complete)));
    assert_eq!(poll_signal(&mut ticks), Some(None));
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn test_dropped_interval_releases_its_timer() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let mut ticks = Sequence::interval(ms(200)).unwrap().subscribe(&engine);

    assert_eq!(poll_signal(&mut ticks), None);
    assert_eq!(clock.pending_timers(), 1);

    drop(ticks);
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn test_interval_does_not_drift_with_late_polls() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let mut ticks = Sequence::interval(ms(100)).unwrap().subscribe(&engine);

    assert_eq!(poll_signal(&mut ticks), None);
    clock.advance(ms(130));
    assert_eq!(poll_signal(&mut ticks), Some(Some(Signal::Next(0))));

    // The next deadline stays on the period grid.
    assert_eq!(poll_signal(&mut ticks), None);
    assert_eq!(clock.next_deadline(), Some(ms(200)));
}

#[test]
fn test_merge_schedule_on_virtual_clock() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let mut merged = numbers_and_words().subscribe(&engine);

    let seen = drain_stepping(&clock, &mut merged);

    assert_eq!(
        seen,
        vec![
            (ms(500), Signal::Next("1")),
            (ms(750), Signal::Next("one")),
            (ms(1000), Signal::Next("2")),
            (ms(1250), Signal::Next("two")),
            (ms(1500), Signal::Next("3")),
            (ms(1750), Signal::Next("three")),
            (ms(1750), Signal::Complete),
        ]
    );
    assert_eq!(clock.pending_timers(), 0);
}

#[test]
fn test_first_with_signal_cancels_losing_timers() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let slow = Sequence::from_values(["a", "b"]).delay_subscription(ms(100));
    let fast = Sequence::from_values(["1", "2"]).delay_elements(ms(50));
    let mut first = Sequence::first_with_signal([slow, fast]).subscribe(&engine);

    assert_eq!(poll_signal(&mut first), None);
    assert_eq!(clock.pending_timers(), 2);

    clock.advance(ms(50));
    assert_eq!(poll_signal(&mut first), Some(Some(Signal::Next("1"))));
    assert_eq!(clock.pending_timers(), 0);

    let rest = drain_stepping(&clock, &mut first);
    assert_eq!(
        rest,
        vec![(ms(100), Signal::Next("2")), (ms(100), Signal::Complete)]
    );
}

#[test]
fn test_cancel_mid_delay_releases_timer() {
    let clock = VirtualClock::new();
    let engine = engine_with_clock(&clock);
    let mut delayed = Sequence::from_values([1, 2, 3])
        .delay_elements(Duration::from_secs(10))
        .subscribe(&engine);

    assert_eq!(poll_signal(&mut delayed), None);
    assert_eq!(clock.pending_timers(), 1);

    delayed.cancel();
    assert_eq!(clock.pending_timers(), 0);
}
