use async_trait::async_trait;
use parking_lot::Mutex;
use rill_core::effects::{TimeEffects, TimeError};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

/// Manually advanced clock for step-by-step timing tests.
///
/// Time only moves when the test calls [`advance`](Self::advance) or
/// [`advance_to_next`](Self::advance_to_next). Every pending sleep is
/// registered as a timer; dropping the sleep removes the registration,
/// which [`pending_timers`](Self::pending_timers) makes observable.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Arc<Mutex<ClockState>>,
}

#[derive(Default)]
struct ClockState {
    now: Duration,
    timers: BTreeMap<(Duration, u64), Waker>,
    next_timer: u64,
}

impl VirtualClock {
    /// Create a clock reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reading.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Move time forward by `by`, waking every sleep whose deadline passed.
    pub fn advance(&self, by: Duration) {
        let due = {
            let mut state = self.state.lock();
            state.now = state.now.saturating_add(by);
            state.take_due()
        };
        tracing::trace!(woken = due.len(), "virtual clock advanced");
        due.into_iter().for_each(Waker::wake);
    }

    /// Jump to the earliest registered deadline. Returns `false` when no
    /// sleep is pending.
    pub fn advance_to_next(&self) -> bool {
        let due = {
            let mut state = self.state.lock();
            let Some(&(deadline, _)) = state.timers.keys().next() else {
                return false;
            };
            state.now = state.now.max(deadline);
            state.take_due()
        };
        due.into_iter().for_each(Waker::wake);
        true
    }

    /// Number of sleeps currently waiting on this clock.
    pub fn pending_timers(&self) -> usize {
        self.state.lock().timers.len()
    }

    /// Earliest registered deadline.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state.lock().timers.keys().next().map(|&(deadline, _)| deadline)
    }
}

impl ClockState {
    fn take_due(&mut self) -> Vec<Waker> {
        let later = self.timers.split_off(&(self.now, u64::MAX));
        std::mem::replace(&mut self.timers, later)
            .into_values()
            .collect()
    }
}

#[async_trait]
impl TimeEffects for VirtualClock {
    fn now(&self) -> Duration {
        VirtualClock::now(self)
    }

    async fn sleep_until(&self, deadline: Duration) -> Result<(), TimeError> {
        VirtualSleep {
            state: self.state.clone(),
            deadline,
            key: None,
        }
        .await;
        Ok(())
    }
}

struct VirtualSleep {
    state: Arc<Mutex<ClockState>>,
    deadline: Duration,
    key: Option<(Duration, u64)>,
}

impl Future for VirtualSleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut state = this.state.lock();

        if state.now >= this.deadline {
            if let Some(key) = this.key.take() {
                state.timers.remove(&key);
            }
            return Poll::Ready(());
        }

        let key = match this.key {
            Some(key) => key,
            None => {
                let key = (this.deadline, state.next_timer);
                state.next_timer += 1;
                this.key = Some(key);
                key
            }
        };
        state.timers.insert(key, cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for VirtualSleep {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.state.lock().timers.remove(&key);
        }
    }
}
