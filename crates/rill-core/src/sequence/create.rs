//! Creation operators.

use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::Sequence;
use crate::errors::{Result, SequenceError};

impl<T: Clone + Send + Sync + 'static> Sequence<T> {
    /// Emit `items` in order, then complete.
    pub fn from_values(items: impl IntoIterator<Item = T>) -> Self {
        let items: Arc<[T]> = items.into_iter().collect();
        Self::from_factory(move |_| {
            let items = items.clone();
            stream::iter((0..items.len()).map(move |i| Ok(items[i].clone()))).boxed()
        })
    }
}

impl<T: Send + 'static> Sequence<T> {
    /// Emit the items of `collection` in its iteration order, then complete.
    ///
    /// The collection is cloned for every subscription.
    pub fn from_iterable<I>(collection: I) -> Self
    where
        I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
        I::IntoIter: Send + 'static,
    {
        Self::from_factory(move |_| stream::iter(collection.clone().into_iter().map(Ok)).boxed())
    }

    /// Emit the single value computed by `f` when subscribed.
    ///
    /// An `Err` from `f` terminates the sequence with that error.
    pub fn lazy<F, E>(f: F) -> Self
    where
        F: Fn() -> std::result::Result<T, E> + Send + Sync + 'static,
        E: Into<SequenceError> + 'static,
    {
        let f = Arc::new(f);
        Self::from_factory(move |_| {
            let f = f.clone();
            stream::once(async move { f().map_err(Into::into) }).boxed()
        })
    }

    /// Fail immediately with `error` on every subscription.
    pub fn error(error: SequenceError) -> Self {
        Self::from_factory(move |_| stream::once(future::ready(Err(error.clone()))).boxed())
    }

    /// Complete without emitting.
    pub fn empty() -> Self {
        Self::from_factory(|_| stream::empty().boxed())
    }

    /// Never emit and never terminate.
    pub fn never() -> Self {
        Self::from_factory(|_| stream::pending().boxed())
    }
}

impl Sequence<i64> {
    /// Emit `count` consecutive integers starting at `start`, then complete.
    ///
    /// Fails with `InvalidArgument` when `count` is negative or the last
    /// value would overflow.
    pub fn range(start: i64, count: i64) -> Result<Self> {
        if count < 0 {
            return Err(SequenceError::invalid_argument(format!(
                "range count must be >= 0, got {count}"
            )));
        }
        if count > 0 && start.checked_add(count - 1).is_none() {
            return Err(SequenceError::invalid_argument(format!(
                "range starting at {start} with {count} values overflows i64"
            )));
        }

        Ok(Self::from_factory(move |_| {
            stream::iter((0..count).map(move |offset| Ok(start + offset))).boxed()
        }))
    }
}

impl Sequence<u64> {
    /// Emit 0, 1, 2, ... once per `period`, forever.
    ///
    /// Deadlines are measured from the subscription instant on the engine
    /// clock, so slow consumers do not accumulate drift. Fails with
    /// `InvalidArgument` for a zero period.
    pub fn interval(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(SequenceError::invalid_argument(
                "interval period must be greater than zero",
            ));
        }

        Ok(Self::from_factory(move |engine| {
            let clock = engine.clock().clone();
            let first = clock.now().saturating_add(period);
            tracing::debug!(?period, "interval scheduled");

            stream::unfold(Some((0u64, first)), move |state| {
                let clock = clock.clone();
                async move {
                    let Some((tick, deadline)) = state else {
                        return None;
                    };
                    match clock.sleep_until(deadline).await {
                        Ok(()) => {
                            let next = deadline.saturating_add(period);
                            Some((Ok(tick), Some((tick + 1, next))))
                        }
                        Err(err) => Some((Err(SequenceError::from(err)), None)),
                    }
                }
            })
            .boxed()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_range_rejected() {
        let err = Sequence::range(1, -1).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidArgument { .. }));
    }

    #[test]
    fn test_overflowing_range_rejected() {
        assert!(Sequence::range(i64::MAX, 2).is_err());
        assert!(Sequence::range(i64::MAX, 1).is_ok());
    }

    #[test]
    fn test_zero_period_rejected() {
        let err = Sequence::interval(Duration::ZERO).unwrap_err();
        assert!(matches!(err, SequenceError::InvalidArgument { .. }));
    }
}
