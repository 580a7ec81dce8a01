//! Real time effect handler for production use

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::effects::{TimeEffects, TimeError};

/// Clock backed by the tokio timer wheel.
///
/// Offsets are measured from the instant the handler was created. Under a
/// paused tokio runtime (`start_paused = true`) the clock auto-advances
/// whenever every task is idle, which gives deterministic timing tests
/// without touching operator code.
#[derive(Debug, Clone)]
pub struct TokioTimeHandler {
    origin: Instant,
}

impl Default for TokioTimeHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TokioTimeHandler {
    /// Create a handler whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

#[async_trait]
impl TimeEffects for TokioTimeHandler {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    async fn sleep_until(&self, deadline: Duration) -> Result<(), TimeError> {
        let target = self
            .origin
            .checked_add(deadline)
            .ok_or_else(|| TimeError::OperationFailed {
                reason: format!("deadline {deadline:?} overflows the clock"),
            })?;
        time::sleep_until(target).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_sleep_advances_paused_clock() {
        let clock = TokioTimeHandler::new();
        clock.sleep(Duration::from_millis(250)).await.unwrap();
        assert!(clock.now() >= Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_until_past_deadline_returns_immediately() {
        let clock = TokioTimeHandler::new();
        clock.sleep(Duration::from_millis(10)).await.unwrap();
        let before = clock.now();
        clock.sleep_until(Duration::ZERO).await.unwrap();
        assert_eq!(clock.now(), before);
    }
}
