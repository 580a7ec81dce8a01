//! Runtime-agnostic task spawning traits.

use futures::future::{AbortHandle, Abortable, BoxFuture, FutureExt};

/// Task spawning contract for worker pools.
///
/// Implementations run the future to completion on some executor; the
/// engine never awaits the spawned task directly and communicates with it
/// through channels.
pub trait TaskSpawner: Send + Sync {
    /// Spawn a background task.
    fn spawn(&self, fut: BoxFuture<'static, ()>);

    /// Spawn a background task that stops at its next poll once the returned
    /// guard is dropped.
    fn spawn_guarded(&self, fut: BoxFuture<'static, ()>) -> TaskGuard {
        let (handle, registration) = AbortHandle::new_pair();
        self.spawn(Abortable::new(fut, registration).map(|_| ()).boxed());
        TaskGuard { handle }
    }
}

/// Aborts the associated task when dropped.
#[derive(Debug)]
pub struct TaskGuard {
    handle: AbortHandle,
}

impl TaskGuard {
    /// Abort the task now.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the task has been aborted.
    pub fn is_aborted(&self) -> bool {
        self.handle.is_aborted()
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
