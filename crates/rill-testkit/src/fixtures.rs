//! Instrumented sources, plus the shared sample payloads.

use futures::stream::{self, StreamExt};
use rill_core::Sequence;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub use rill_core::samples::{expected_points, FRUITS, POINT_TEXTS};

/// Number of values pulled out of a [`counted`] source, across all of its
/// subscriptions.
#[derive(Debug, Clone, Default)]
pub struct PullCounter(Arc<AtomicUsize>);

impl PullCounter {
    /// Values pulled so far.
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// A finite source that records every value a downstream stage pulls.
pub fn counted<T>(values: Vec<T>) -> (Sequence<T>, PullCounter)
where
    T: Clone + Send + Sync + 'static,
{
    let counter = PullCounter::default();
    let pulls = counter.clone();
    let source = Sequence::from_factory(move |_| {
        let pulls = pulls.clone();
        stream::iter(values.clone())
            .map(move |value| {
                pulls.bump();
                Ok(value)
            })
            .boxed()
    });
    (source, counter)
}
