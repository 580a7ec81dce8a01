//! Asynchronous operators that dispatch work to the engine's worker pool.
//!
//! Workers never call back into the consumer. Each dispatched unit owns a
//! clone of a bounded channel sender and reports its values, followed by a
//! `Done` or `Failed` event, to the stage that spawned it. The stage keeps a
//! [`TaskGuard`] per live unit so that dropping it aborts all outstanding
//! work and discards whatever was still in flight.

use futures::channel::mpsc;
use futures::future::FutureExt;
use futures::stream::{self, Stream, StreamExt};
use futures::SinkExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use super::{Sequence, SignalStream};
use crate::effects::TaskGuard;
use crate::engine::SequenceEngine;
use crate::errors::{Result, SequenceError};

type InnerFactory<T, U> = dyn Fn(T, &SequenceEngine) -> SignalStream<U> + Send + Sync;

impl<T: Send + 'static> Sequence<T> {
    /// Map every value to an inner sequence driven on a worker and merge
    /// the inner outputs as they arrive.
    ///
    /// Output order across inputs is not defined. Completes once the
    /// upstream is exhausted and every inner sequence has completed; the
    /// first error from any of them terminates the output.
    pub fn flat_map<U, F>(self, f: F) -> Sequence<U>
    where
        U: Send + 'static,
        F: Fn(T) -> Sequence<U> + Send + Sync + 'static,
    {
        self.flat_map_with(Arc::new(move |value: T, engine: &SequenceEngine| {
            f(value).open(engine)
        }))
    }

    /// Compute `f(value)` on a worker for every value and emit results as
    /// they become available.
    ///
    /// A failing or panicking unit terminates the sequence with an error
    /// and aborts the remaining units.
    pub fn flat_map_async<U, E, F>(self, f: F) -> Sequence<U>
    where
        U: Send + 'static,
        E: Into<SequenceError> + 'static,
        F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        self.flat_map_with(Arc::new(move |value: T, _engine: &SequenceEngine| {
            let f = f.clone();
            stream::once(async move { f(value).map_err(Into::into) }).boxed()
        }))
    }

    /// Subscribe to this sequence on a worker and forward its signals
    /// through a bounded channel.
    pub fn subscribe_on(self) -> Self {
        Self::from_factory(move |engine| {
            let (tx, rx) = mpsc::channel(engine.config().worker_channel_capacity);
            let task = forward(self.clone(), engine.clone(), tx);
            let guard = engine.spawner().spawn_guarded(task.boxed());
            Forwarded { rx, _guard: guard }.boxed()
        })
    }

    fn flat_map_with<U: Send + 'static>(self, inner: Arc<InnerFactory<T, U>>) -> Sequence<U> {
        Sequence::from_factory(move |engine| {
            let config = engine.config();
            let (tx, rx) = mpsc::channel(config.worker_channel_capacity);
            FlatMap {
                engine: engine.clone(),
                upstream: Some(self.open(engine)),
                inner: inner.clone(),
                tx,
                rx,
                in_flight: HashMap::new(),
                next_id: 0,
                max_in_flight: config.max_in_flight,
                finished: false,
            }
            .boxed()
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("worker task panicked: {detail}")
}

/// Drive `sequence` to its end, pushing every item into `tx`.
async fn forward<T: Send + 'static>(
    sequence: Sequence<T>,
    engine: SequenceEngine,
    mut tx: mpsc::Sender<Result<T>>,
) {
    let drive = async {
        let mut stream = sequence.open(&engine);
        while let Some(item) = stream.next().await {
            let failed = item.is_err();
            if tx.send(item).await.is_err() || failed {
                return;
            }
        }
    };

    let outcome = AssertUnwindSafe(drive).catch_unwind().await;
    if let Err(panic) = outcome {
        let _ = tx
            .send(Err(SequenceError::upstream(panic_message(&*panic))))
            .await;
    }
}

struct Forwarded<T> {
    rx: mpsc::Receiver<Result<T>>,
    _guard: TaskGuard,
}

// No field is ever pinned.
impl<T> Unpin for Forwarded<T> {}

impl<T> Stream for Forwarded<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_next_unpin(cx)
    }
}

enum WorkerEvent<U> {
    Next(U),
    Done(u64),
    Failed(u64, SequenceError),
}

async fn drive_inner<T, U>(
    id: u64,
    value: T,
    inner: Arc<InnerFactory<T, U>>,
    engine: SequenceEngine,
    mut tx: mpsc::Sender<WorkerEvent<U>>,
) where
    T: Send + 'static,
    U: Send + 'static,
{
    let drive = async {
        let mut stream = inner(value, &engine);
        while let Some(item) = stream.next().await {
            match item {
                Ok(next) => {
                    if tx.send(WorkerEvent::Next(next)).await.is_err() {
                        return None;
                    }
                }
                Err(err) => return Some(WorkerEvent::Failed(id, err)),
            }
        }
        Some(WorkerEvent::Done(id))
    };

    let outcome = AssertUnwindSafe(drive).catch_unwind().await;
    let event = match outcome {
        Ok(Some(event)) => event,
        // Receiver gone: the stage was cancelled.
        Ok(None) => return,
        Err(panic) => WorkerEvent::Failed(id, SequenceError::upstream(panic_message(&*panic))),
    };
    let _ = tx.send(event).await;
}

struct FlatMap<T, U> {
    engine: SequenceEngine,
    upstream: Option<SignalStream<T>>,
    inner: Arc<InnerFactory<T, U>>,
    tx: mpsc::Sender<WorkerEvent<U>>,
    rx: mpsc::Receiver<WorkerEvent<U>>,
    in_flight: HashMap<u64, TaskGuard>,
    next_id: u64,
    max_in_flight: usize,
    finished: bool,
}

// No field is ever pinned.
impl<T, U> Unpin for FlatMap<T, U> {}

impl<T: Send + 'static, U: Send + 'static> FlatMap<T, U> {
    fn dispatch(&mut self, value: T) {
        let id = self.next_id;
        self.next_id += 1;

        let task = drive_inner(
            id,
            value,
            self.inner.clone(),
            self.engine.clone(),
            self.tx.clone(),
        );
        let guard = self.engine.spawner().spawn_guarded(task.boxed());
        self.in_flight.insert(id, guard);
        tracing::trace!(unit = id, in_flight = self.in_flight.len(), "dispatched to worker");
    }

    fn finish(&mut self) {
        self.finished = true;
        self.upstream = None;
        if !self.in_flight.is_empty() {
            tracing::debug!(aborted = self.in_flight.len(), "aborting in-flight units");
            self.in_flight.clear();
        }
    }
}

impl<T: Send + 'static, U: Send + 'static> Stream for FlatMap<T, U> {
    type Item = Result<U>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            while this.in_flight.len() < this.max_in_flight {
                let Some(upstream) = this.upstream.as_mut() else {
                    break;
                };
                match upstream.poll_next_unpin(cx) {
                    Poll::Ready(Some(Ok(value))) => this.dispatch(value),
                    Poll::Ready(Some(Err(err))) => {
                        this.finish();
                        return Poll::Ready(Some(Err(err)));
                    }
                    Poll::Ready(None) => this.upstream = None,
                    Poll::Pending => break,
                }
            }

            if this.upstream.is_none() && this.in_flight.is_empty() {
                this.finish();
                return Poll::Ready(None);
            }

            match this.rx.poll_next_unpin(cx) {
                Poll::Ready(Some(WorkerEvent::Next(value))) => return Poll::Ready(Some(Ok(value))),
                Poll::Ready(Some(WorkerEvent::Done(id))) => {
                    this.in_flight.remove(&id);
                }
                Poll::Ready(Some(WorkerEvent::Failed(id, err))) => {
                    this.in_flight.remove(&id);
                    this.finish();
                    return Poll::Ready(Some(Err(err)));
                }
                // Unreachable while `tx` is held; treat as exhaustion.
                Poll::Ready(None) => {
                    this.finish();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
