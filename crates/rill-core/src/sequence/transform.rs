//! Synchronous transformation operators.
//!
//! Everything here runs inline on the task that polls the subscription;
//! per-subscription state (the `distinct` seen-set, the `buffer` batch, the
//! `take`/`skip` counters) is created inside the factory and never shared.

use futures::future;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::hash::Hash;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use super::{Sequence, SignalStream};
use crate::errors::{Result, SequenceError};

impl<T: Send + 'static> Sequence<T> {
    /// Pass through only values for which `predicate` holds.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let predicate = Arc::new(predicate);
        Self::from_factory(move |engine| {
            let predicate = predicate.clone();
            self.open(engine)
                .try_filter(move |value| future::ready(predicate(value)))
                .boxed()
        })
    }

    /// Emit at most the first `n` values, then complete.
    ///
    /// The upstream is dropped as soon as the `n`-th value is delivered and
    /// is never pulled again.
    pub fn take(self, n: usize) -> Self {
        Self::from_factory(move |engine| {
            if n == 0 {
                return futures::stream::empty().boxed();
            }
            Take {
                upstream: Some(self.open(engine)),
                remaining: n,
            }
            .boxed()
        })
    }

    /// Discard the first `n` values.
    pub fn skip(self, n: usize) -> Self {
        Self::from_factory(move |engine| {
            let mut remaining = n;
            self.open(engine)
                .try_filter(move |_| {
                    let keep = remaining == 0;
                    if !keep {
                        remaining -= 1;
                    }
                    future::ready(keep)
                })
                .boxed()
        })
    }

    /// Apply `f` to every value.
    pub fn map<U, F>(self, f: F) -> Sequence<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Sequence::from_factory(move |engine| {
            let f = f.clone();
            self.open(engine).map_ok(move |value| f(value)).boxed()
        })
    }

    /// Apply a fallible `f` to every value; the first `Err` terminates the
    /// sequence.
    pub fn try_map<U, E, F>(self, f: F) -> Sequence<U>
    where
        U: Send + 'static,
        E: Into<SequenceError> + 'static,
        F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Sequence::from_factory(move |engine| {
            let f = f.clone();
            self.open(engine)
                .and_then(move |value| future::ready(f(value).map_err(Into::into)))
                .boxed()
        })
    }

    /// Group consecutive values into batches of `size`; the last batch may
    /// be shorter. Fails with `InvalidArgument` for a zero size.
    ///
    /// On upstream error the partial batch is discarded.
    pub fn buffer(self, size: usize) -> Result<Sequence<Vec<T>>> {
        if size == 0 {
            return Err(SequenceError::invalid_argument(
                "buffer size must be greater than zero",
            ));
        }

        Ok(Sequence::from_factory(move |engine| {
            Buffer {
                upstream: Some(self.open(engine)),
                size,
                batch: Vec::with_capacity(size),
            }
            .boxed()
        }))
    }
}

impl<T: Clone + Eq + Hash + Send + 'static> Sequence<T> {
    /// Suppress values equal to any value already emitted on this
    /// subscription, keeping first-occurrence order.
    pub fn distinct(self) -> Self {
        Self::from_factory(move |engine| {
            let mut seen = HashSet::new();
            self.open(engine)
                .try_filter(move |value| future::ready(seen.insert(value.clone())))
                .boxed()
        })
    }
}

struct Take<T> {
    upstream: Option<SignalStream<T>>,
    remaining: usize,
}

impl<T> Stream for Take<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(upstream.poll_next_unpin(cx)) {
            Some(Ok(value)) => {
                this.remaining -= 1;
                if this.remaining == 0 {
                    tracing::trace!("take limit reached, cancelling upstream");
                    this.upstream = None;
                }
                Poll::Ready(Some(Ok(value)))
            }
            other => {
                this.upstream = None;
                Poll::Ready(other)
            }
        }
    }
}

struct Buffer<T> {
    upstream: Option<SignalStream<T>>,
    size: usize,
    batch: Vec<T>,
}

// No field is ever pinned.
impl<T> Unpin for Buffer<T> {}

impl<T> Stream for Buffer<T> {
    type Item = Result<Vec<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let Some(upstream) = this.upstream.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(upstream.poll_next_unpin(cx)) {
                Some(Ok(value)) => {
                    this.batch.push(value);
                    if this.batch.len() == this.size {
                        let full = mem::replace(&mut this.batch, Vec::with_capacity(this.size));
                        return Poll::Ready(Some(Ok(full)));
                    }
                }
                Some(Err(err)) => {
                    this.upstream = None;
                    this.batch.clear();
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    this.upstream = None;
                    if this.batch.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(Ok(mem::take(&mut this.batch))));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequenceEngine;
    use futures::executor::block_on;

    fn collect<T: Send + 'static>(sequence: &Sequence<T>) -> Result<Vec<T>> {
        let engine = SequenceEngine::default();
        block_on(sequence.subscribe(&engine).collect_values())
    }

    #[test]
    fn test_filter_keeps_single_word_parks() {
        let parks = Sequence::from_values([
            "Yellowstone",
            "Yosemite",
            "Grand Canyon",
            "Zion",
            "Grand Teton",
        ])
        .filter(|park| !park.contains(' '));
        assert_eq!(collect(&parks).unwrap(), ["Yellowstone", "Yosemite", "Zion"]);
    }

    #[test]
    fn test_skip_more_than_available_completes_empty() {
        let skipped = Sequence::from_values([1, 2]).skip(5);
        assert!(collect(&skipped).unwrap().is_empty());
    }

    #[test]
    fn test_take_zero_completes_empty() {
        let taken = Sequence::from_values([1, 2]).take(0);
        assert!(collect(&taken).unwrap().is_empty());
    }

    #[test]
    fn test_try_map_error_terminates() {
        let parsed = Sequence::from_values(["1", "x", "3"]).try_map(|s| s.parse::<i32>());
        let err = collect(&parsed).unwrap_err();
        assert!(matches!(err, SequenceError::DecodeFailure { .. }));
    }

    #[test]
    fn test_buffer_zero_rejected() {
        assert!(Sequence::from_values([1]).buffer(0).is_err());
    }

    #[test]
    fn test_buffer_discards_partial_batch_on_error() {
        let failing = Sequence::from_values([1, 2])
            .try_map(|v| if v == 2 { Err(SequenceError::upstream("bad")) } else { Ok(v) })
            .buffer(3)
            .unwrap();
        let engine = SequenceEngine::default();
        let mut sub = failing.subscribe(&engine);
        let first = block_on(sub.next_signal());
        assert!(matches!(first, Some(crate::Signal::Error(_))));
    }

    #[test]
    fn test_distinct_state_is_per_subscription() {
        let animals = Sequence::from_values(["dog", "dog", "cat"]).distinct();
        assert_eq!(collect(&animals).unwrap(), ["dog", "cat"]);
        assert_eq!(collect(&animals).unwrap(), ["dog", "cat"]);
    }
}
