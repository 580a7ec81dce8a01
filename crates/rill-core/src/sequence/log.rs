//! Signal tracing stage.

use futures::stream::{Stream, StreamExt};
use std::fmt::Debug;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use super::{Sequence, SignalStream};
use crate::errors::Result;

impl<T: Debug + Send + 'static> Sequence<T> {
    /// Emit a `tracing` event for every signal passing through, tagged with
    /// `category`. Values pass through unchanged.
    ///
    /// Dropping the stage before a terminal signal logs a `cancel` event.
    pub fn log(self, category: impl Into<String>) -> Self {
        let category = category.into();
        Self::from_factory(move |engine| {
            tracing::info!(category = %category, "onSubscribe");
            Logged {
                upstream: Some(self.open(engine)),
                category: category.clone(),
            }
            .boxed()
        })
    }
}

struct Logged<T> {
    upstream: Option<SignalStream<T>>,
    category: String,
}

impl<T: Debug> Stream for Logged<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(upstream) = this.upstream.as_mut() else {
            return Poll::Ready(None);
        };

        let item = ready!(upstream.poll_next_unpin(cx));
        match &item {
            Some(Ok(value)) => tracing::info!(category = %this.category, "onNext({value:?})"),
            Some(Err(err)) => {
                tracing::info!(category = %this.category, "onError({err})");
                this.upstream = None;
            }
            None => {
                tracing::info!(category = %this.category, "onComplete()");
                this.upstream = None;
            }
        }
        Poll::Ready(item)
    }
}

impl<T> Drop for Logged<T> {
    fn drop(&mut self) {
        if self.upstream.is_some() {
            tracing::info!(category = %self.category, "cancel()");
        }
    }
}
