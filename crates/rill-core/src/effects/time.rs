//! Clock effect used by `interval`, `delay_elements` and `delay_subscription`.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Error type for time operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The clock backing this handler is gone (runtime shut down, clock dropped)
    #[error("Time service unavailable")]
    ServiceUnavailable,
    /// Any other clock failure
    #[error("Operation failed: {reason}")]
    OperationFailed {
        /// Description of the failure
        reason: String,
    },
}

/// Monotonic clock with cancellable sleeps.
///
/// Time is expressed as the offset from the clock's own origin. Dropping a
/// sleep future before it resolves must release whatever timer it
/// registered.
#[async_trait]
pub trait TimeEffects: Send + Sync {
    /// Elapsed time since the clock's origin.
    fn now(&self) -> Duration;

    /// Sleep until the clock reads at least `deadline`.
    async fn sleep_until(&self, deadline: Duration) -> Result<(), TimeError>;

    /// Sleep for `duration` measured from the moment the sleep is first polled.
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        let deadline = self.now().saturating_add(duration);
        self.sleep_until(deadline).await
    }
}

/// Blanket implementation for Arc<T> where T: TimeEffects
#[async_trait]
impl<T: TimeEffects + ?Sized> TimeEffects for Arc<T> {
    fn now(&self) -> Duration {
        (**self).now()
    }

    async fn sleep_until(&self, deadline: Duration) -> Result<(), TimeError> {
        (**self).sleep_until(deadline).await
    }

    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        (**self).sleep(duration).await
    }
}
