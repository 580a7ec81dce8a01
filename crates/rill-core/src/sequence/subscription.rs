//! Consumer side of a sequence.

use futures::stream::{FusedStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{ready, Context, Poll};

use super::{Signal, SignalStream};
use crate::errors::SequenceError;

static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// The live relationship between a sequence and its consumer.
///
/// A subscription yields `Signal::Next` values, then exactly one terminal
/// signal (`Complete` or `Error`), then `None` forever. Dropping it, or
/// calling [`cancel`](Self::cancel), tears down the whole pipeline.
pub struct Subscription<T> {
    id: u64,
    pipeline: Option<SignalStream<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(pipeline: SignalStream<T>) -> Self {
        let id = NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(subscription = id, "subscribed");
        Self {
            id,
            pipeline: Some(pipeline),
        }
    }

    /// Process-unique identifier, used in log events.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next signal. `None` once the terminal signal was delivered.
    pub async fn next_signal(&mut self) -> Option<Signal<T>> {
        self.next().await
    }

    /// Whether the terminal signal was delivered or the subscription cancelled.
    pub fn is_finished(&self) -> bool {
        self.pipeline.is_none()
    }

    /// Cancel the subscription and every upstream stage.
    pub fn cancel(mut self) {
        if self.pipeline.take().is_some() {
            tracing::debug!(subscription = self.id, "cancelled");
        }
    }

    /// Drain all values until the terminal signal.
    ///
    /// Never returns for infinite sequences.
    pub async fn collect_values(mut self) -> Result<Vec<T>, SequenceError> {
        let mut values = Vec::new();
        while let Some(signal) = self.next().await {
            match signal {
                Signal::Next(value) => values.push(value),
                Signal::Complete => break,
                Signal::Error(err) => return Err(err),
            }
        }
        Ok(values)
    }
}

impl<T> Stream for Subscription<T> {
    type Item = Signal<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(pipeline) = this.pipeline.as_mut() else {
            return Poll::Ready(None);
        };

        let signal = match ready!(pipeline.poll_next_unpin(cx)) {
            Some(Ok(value)) => return Poll::Ready(Some(Signal::Next(value))),
            Some(Err(err)) => {
                tracing::debug!(subscription = this.id, error = %err, "terminated with error");
                Signal::Error(err)
            }
            None => {
                tracing::debug!(subscription = this.id, "completed");
                Signal::Complete
            }
        };
        this.pipeline = None;
        Poll::Ready(Some(signal))
    }
}

impl<T> FusedStream for Subscription<T> {
    fn is_terminated(&self) -> bool {
        self.pipeline.is_none()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            tracing::debug!(subscription = self.id, "dropped before terminal signal");
        }
    }
}
