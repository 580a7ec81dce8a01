//! # Rill Testkit
//!
//! Deterministic support for testing sequences:
//!
//! - [`VirtualClock`]: a manually advanced [`TimeEffects`] implementation
//! - engine builders wired to a virtual clock
//! - instrumented sources and signal collection helpers
//! - shared payload fixtures
//!
//! [`TimeEffects`]: rill_core::effects::TimeEffects

pub mod fixtures;
pub mod time;

pub use fixtures::{counted, PullCounter};
pub use time::VirtualClock;

use futures::{FutureExt, StreamExt};
use rill_core::{EngineConfig, SequenceEngine, Signal, Subscription};

/// Engine whose timers run on `clock`; workers go to the current tokio
/// runtime.
pub fn engine_with_clock(clock: &VirtualClock) -> SequenceEngine {
    SequenceEngine::builder()
        .clock(clock.clone())
        .config(EngineConfig::default())
        .build()
}

/// Install a test-friendly tracing subscriber. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Poll `subscription` once without blocking.
///
/// `None` means no signal is ready yet; `Some(None)` means the subscription
/// already delivered its terminal signal.
pub fn poll_signal<T>(subscription: &mut Subscription<T>) -> Option<Option<Signal<T>>> {
    subscription.next().now_or_never()
}

/// Drain every signal including the terminal one.
pub async fn collect_signals<T>(subscription: Subscription<T>) -> Vec<Signal<T>> {
    subscription.collect().await
}
