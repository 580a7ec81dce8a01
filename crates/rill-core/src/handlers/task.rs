use futures::future::BoxFuture;
use tokio::runtime::Handle;

use crate::effects::TaskSpawner;

/// Worker pool backed by a tokio runtime.
///
/// Without an explicit handle, tasks go to the runtime of the caller, so
/// subscriptions must be polled from inside a runtime when asynchronous
/// operators are involved.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    handle: Option<Handle>,
}

impl TokioSpawner {
    /// Spawn onto whichever runtime is current at spawn time.
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Spawn onto a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn(&self, fut: BoxFuture<'static, ()>) {
        // Join handles are detached; cancellation goes through TaskGuard.
        match &self.handle {
            Some(handle) => {
                handle.spawn(fut);
            }
            None => {
                tokio::spawn(fut);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_spawned_task_runs() {
        let spawner = TokioSpawner::new();
        let (tx, rx) = oneshot::channel();
        spawner.spawn(
            async move {
                let _ = tx.send(7);
            }
            .boxed(),
        );
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_guard_drop_cancels_pending_task() {
        let spawner = TokioSpawner::new();
        let (tx, rx) = oneshot::channel::<()>();
        let guard = spawner.spawn_guarded(
            async move {
                futures::future::pending::<()>().await;
                let _ = tx.send(());
            }
            .boxed(),
        );
        drop(guard);
        // The aborted task drops its sender without sending.
        assert!(rx.await.is_err());
    }
}
