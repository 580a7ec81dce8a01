//! # Sequences
//!
//! A [`Sequence<T>`] is a cold, restartable description of a producer of
//! values followed by a terminal signal. Nothing runs until the sequence is
//! subscribed against a [`SequenceEngine`]; every subscription calls the
//! sequence's factory again and gets an independent pipeline.
//!
//! ## Pipeline model
//!
//! Each stage is a boxed [`Stream`] of `Result<T, SequenceError>` that owns
//! its upstream stage by value. Dropping a stage therefore drops (cancels)
//! everything above it: pending timers are released and guarded worker
//! tasks are aborted.
//!
//! Operators are grouped by concern:
//!
//! - `create`: `from_values`, `from_iterable`, `range`, `interval`, `lazy`,
//!   `empty`, `error`, `never`
//! - `transform`: `filter`, `distinct`, `take`, `skip`, `map`, `try_map`,
//!   `buffer`
//! - `flat_map`: `flat_map`, `flat_map_async`, `subscribe_on`
//! - `combine`: `merge_with`, `merge`, `zip`, `first_with_signal`
//! - `timing`: `delay_elements`, `delay_subscription`
//! - `log`: signal tracing
//!
//! [`Stream`]: futures::Stream

mod combine;
mod create;
mod flat_map;
mod log;
mod subscription;
mod timing;
mod transform;

pub use subscription::Subscription;

use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

use crate::engine::SequenceEngine;
use crate::errors::SequenceError;

/// One materialised stage of a pipeline.
pub type SignalStream<T> = BoxStream<'static, Result<T, SequenceError>>;

type Factory<T> = dyn Fn(&SequenceEngine) -> SignalStream<T> + Send + Sync;

/// A lazily produced, possibly asynchronous sequence of `T`.
pub struct Sequence<T> {
    factory: Arc<Factory<T>>,
}

impl<T> Clone for Sequence<T> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
        }
    }
}

impl<T> fmt::Debug for Sequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence").finish_non_exhaustive()
    }
}

impl<T: Send + 'static> Sequence<T> {
    /// Build a sequence from a factory invoked once per subscription.
    ///
    /// The returned stream must stop after yielding its first `Err`; the
    /// subscription enforces this regardless, but operators rely on it to
    /// release upstream resources promptly.
    pub fn from_factory<F>(factory: F) -> Self
    where
        F: Fn(&SequenceEngine) -> SignalStream<T> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }

    /// Materialise this sequence's pipeline without wrapping it in a
    /// [`Subscription`].
    pub fn open(&self, engine: &SequenceEngine) -> SignalStream<T> {
        (self.factory)(engine)
    }

    /// Subscribe against `engine`.
    pub fn subscribe(&self, engine: &SequenceEngine) -> Subscription<T> {
        Subscription::new(self.open(engine))
    }
}

/// A signal observed by a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal<T> {
    /// A value
    Next(T),
    /// Normal completion
    Complete,
    /// Terminal failure
    Error(SequenceError),
}

impl<T> Signal<T> {
    /// Whether this signal ends the sequence.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }

    /// The carried value, if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Signal::Next(value) => Some(value),
            _ => None,
        }
    }
}
