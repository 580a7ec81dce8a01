//! Operators that combine several sequences into one.

use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use super::{Sequence, SignalStream};
use crate::errors::Result;

impl<T: Send + 'static> Sequence<T> {
    /// Interleave the values of `self` and `other` as they arrive.
    ///
    /// Completes once both sides have completed. The first error from
    /// either side terminates the output and cancels the other side.
    pub fn merge_with(self, other: Sequence<T>) -> Self {
        Self::from_factory(move |engine| {
            let merged = stream::select(self.open(engine), other.open(engine));
            UntilError::new(merged.boxed()).boxed()
        })
    }

    /// Merge any number of sequences. Completes when all of them have
    /// completed; an empty set completes immediately.
    pub fn merge(sources: impl IntoIterator<Item = Sequence<T>>) -> Self {
        let sources: Vec<_> = sources.into_iter().collect();
        Self::from_factory(move |engine| {
            let merged = stream::select_all(sources.iter().map(|source| source.open(engine)));
            UntilError::new(merged.boxed()).boxed()
        })
    }

    /// Mirror whichever candidate signals first.
    ///
    /// All candidates are subscribed together. The first one to produce a
    /// value, a completion or an error wins and every other candidate is
    /// cancelled at that moment. When several are ready in the same poll
    /// the lowest index wins. With no candidates the result completes
    /// immediately.
    pub fn first_with_signal(candidates: impl IntoIterator<Item = Sequence<T>>) -> Self {
        let candidates: Vec<_> = candidates.into_iter().collect();
        Self::from_factory(move |engine| {
            FirstWithSignal {
                racing: candidates.iter().map(|c| c.open(engine)).collect(),
                winner: None,
            }
            .boxed()
        })
    }
}

impl<A: Send + 'static> Sequence<A> {
    /// Pair the i-th value of `self` with the i-th value of `other`.
    ///
    /// Completes as soon as either side has completed and no further pair
    /// can be formed. An error on either side is delivered immediately,
    /// without waiting for a partner value.
    pub fn zip<B: Send + 'static>(self, other: Sequence<B>) -> Sequence<(A, B)> {
        self.zip_with(other, |a, b| (a, b))
    }

    /// Like [`zip`](Self::zip), combining each pair with `combine`.
    pub fn zip_with<B, C, F>(self, other: Sequence<B>, combine: F) -> Sequence<C>
    where
        B: Send + 'static,
        C: Send + 'static,
        F: Fn(A, B) -> C + Clone + Send + Sync + 'static,
    {
        Sequence::from_factory(move |engine| {
            Zip {
                left: Some(self.open(engine)),
                right: Some(other.open(engine)),
                queued_left: None,
                queued_right: None,
                combine: combine.clone(),
            }
            .boxed()
        })
    }
}

/// Ends the wrapped stream right after its first `Err`, dropping it.
struct UntilError<T> {
    inner: Option<SignalStream<T>>,
}

impl<T> UntilError<T> {
    fn new(inner: SignalStream<T>) -> Self {
        Self { inner: Some(inner) }
    }
}

impl<T> Stream for UntilError<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        let item = ready!(inner.poll_next_unpin(cx));
        if !matches!(item, Some(Ok(_))) {
            this.inner = None;
        }
        Poll::Ready(item)
    }
}

struct Zip<A, B, F> {
    left: Option<SignalStream<A>>,
    right: Option<SignalStream<B>>,
    queued_left: Option<A>,
    queued_right: Option<B>,
    combine: F,
}

// No field is ever pinned.
impl<A, B, F> Unpin for Zip<A, B, F> {}

impl<A, B, F> Zip<A, B, F> {
    fn close(&mut self) {
        self.left = None;
        self.right = None;
        self.queued_left = None;
        self.queued_right = None;
    }
}

impl<A, B, C, F> Stream for Zip<A, B, F>
where
    F: Fn(A, B) -> C,
{
    type Item = Result<C>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.queued_left.is_none() {
            if let Some(left) = this.left.as_mut() {
                match left.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(value))) => this.queued_left = Some(value),
                    Poll::Ready(Some(Err(err))) => {
                        this.close();
                        return Poll::Ready(Some(Err(err)));
                    }
                    Poll::Ready(None) => this.left = None,
                    Poll::Pending => {}
                }
            }
        }

        if this.queued_right.is_none() {
            if let Some(right) = this.right.as_mut() {
                match right.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(value))) => this.queued_right = Some(value),
                    Poll::Ready(Some(Err(err))) => {
                        this.close();
                        return Poll::Ready(Some(Err(err)));
                    }
                    Poll::Ready(None) => this.right = None,
                    Poll::Pending => {}
                }
            }
        }

        let left_exhausted = this.left.is_none() && this.queued_left.is_none();
        let right_exhausted = this.right.is_none() && this.queued_right.is_none();
        if left_exhausted || right_exhausted {
            this.close();
            return Poll::Ready(None);
        }

        match (this.queued_left.take(), this.queued_right.take()) {
            (Some(a), Some(b)) => Poll::Ready(Some(Ok((this.combine)(a, b)))),
            (a, b) => {
                this.queued_left = a;
                this.queued_right = b;
                Poll::Pending
            }
        }
    }
}

struct FirstWithSignal<T> {
    racing: Vec<SignalStream<T>>,
    winner: Option<SignalStream<T>>,
}

impl<T> Stream for FirstWithSignal<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(winner) = this.winner.as_mut() {
            let item = ready!(winner.poll_next_unpin(cx));
            if !matches!(item, Some(Ok(_))) {
                this.winner = None;
            }
            return Poll::Ready(item);
        }

        if this.racing.is_empty() {
            return Poll::Ready(None);
        }

        for index in 0..this.racing.len() {
            if let Poll::Ready(item) = this.racing[index].poll_next_unpin(cx) {
                let winner = this.racing.swap_remove(index);
                tracing::debug!(
                    winner = index,
                    cancelled = this.racing.len(),
                    "first signal received, cancelling other candidates"
                );
                this.racing.clear();
                if matches!(item, Some(Ok(_))) {
                    this.winner = Some(winner);
                }
                return Poll::Ready(item);
            }
        }

        Poll::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SequenceError;
    use crate::SequenceEngine;
    use futures::executor::block_on;

    fn collect<T: Send + 'static>(sequence: &Sequence<T>) -> Result<Vec<T>> {
        let engine = SequenceEngine::default();
        block_on(sequence.subscribe(&engine).collect_values())
    }

    #[test]
    fn test_zip_stops_at_shorter_side() {
        let zipped = Sequence::from_values([1, 2, 3]).zip(Sequence::from_values(["a", "b"]));
        assert_eq!(collect(&zipped).unwrap(), [(1, "a"), (2, "b")]);
    }

    #[test]
    fn test_zip_error_is_not_held_back() {
        let failing = Sequence::<&str>::error(SequenceError::upstream("offline"));
        let zipped = Sequence::<i32>::never().zip(failing);
        let err = collect(&zipped).unwrap_err();
        assert_eq!(err, SequenceError::upstream("offline"));
    }

    #[test]
    fn test_merge_of_nothing_completes() {
        let merged = Sequence::<u8>::merge(Vec::new());
        assert!(collect(&merged).unwrap().is_empty());
    }

    #[test]
    fn test_merge_with_error_terminates() {
        let merged = Sequence::<i32>::never()
            .merge_with(Sequence::error(SequenceError::upstream("down")));
        assert!(collect(&merged).is_err());
    }

    #[test]
    fn test_first_with_signal_prefers_lowest_index() {
        let first = Sequence::first_with_signal([
            Sequence::from_values(["left"]),
            Sequence::from_values(["right"]),
        ]);
        assert_eq!(collect(&first).unwrap(), ["left"]);
    }

    #[test]
    fn test_first_with_signal_completion_wins() {
        let first = Sequence::first_with_signal([Sequence::never(), Sequence::<u8>::empty()]);
        assert!(collect(&first).unwrap().is_empty());
    }

    #[test]
    fn test_first_with_signal_no_candidates_completes() {
        let first = Sequence::<u8>::first_with_signal(Vec::new());
        assert!(collect(&first).unwrap().is_empty());
    }
}
