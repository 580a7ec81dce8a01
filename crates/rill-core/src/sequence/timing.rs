//! Operators that shift signals in time on the engine clock.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;

use super::Sequence;
use crate::errors::SequenceError;

impl<T: Send + 'static> Sequence<T> {
    /// Delay every value by `delay`. Errors and completion are not delayed.
    pub fn delay_elements(self, delay: Duration) -> Self {
        Self::from_factory(move |engine| {
            let clock = engine.clock().clone();
            self.open(engine)
                .and_then(move |value| {
                    let clock = clock.clone();
                    async move {
                        clock
                            .sleep(delay)
                            .await
                            .map(|()| value)
                            .map_err(SequenceError::from)
                    }
                })
                .boxed()
        })
    }

    /// Subscribe to the upstream only after `delay` has elapsed.
    ///
    /// Cancelling before the delay elapses means the upstream factory is
    /// never invoked.
    pub fn delay_subscription(self, delay: Duration) -> Self {
        Self::from_factory(move |engine| {
            let clock = engine.clock().clone();
            let upstream = self.clone();
            let engine = engine.clone();
            stream::once(async move {
                match clock.sleep(delay).await {
                    Ok(()) => {
                        tracing::trace!(?delay, "delayed subscription starting");
                        upstream.open(&engine)
                    }
                    Err(err) => stream::once(async move { Err(SequenceError::from(err)) }).boxed(),
                }
            })
            .flatten()
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequenceEngine;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_delay_elements_spaces_values() {
        let engine = SequenceEngine::default();
        let start = engine.clock().now();
        let values = Sequence::from_values([1, 2, 3])
            .delay_elements(Duration::from_millis(100))
            .subscribe(&engine)
            .collect_values()
            .await
            .unwrap();

        assert_eq!(values, [1, 2, 3]);
        assert!(engine.clock().now() - start >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_subscription_defers_factory() {
        let engine = SequenceEngine::default();
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = opened.clone();
        let source = Sequence::from_factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            stream::iter([Ok(7)]).boxed()
        });

        let mut sub = source
            .delay_subscription(Duration::from_millis(50))
            .subscribe(&engine);
        assert_eq!(opened.load(Ordering::SeqCst), 0);

        assert_eq!(sub.next_signal().await.and_then(|s| s.into_value()), Some(7));
        assert_eq!(opened.load(Ordering::SeqCst), 1);
        assert!(engine.clock().now() >= Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_delay_never_subscribes_upstream() {
        let engine = SequenceEngine::default();
        let opened = Arc::new(AtomicUsize::new(0));
        let counter = opened.clone();
        let source = Sequence::<u8>::from_factory(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            stream::empty().boxed()
        });

        let sub = source
            .delay_subscription(Duration::from_secs(1))
            .subscribe(&engine);
        sub.cancel();
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }
}
