use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of asking the scheduler for permission to refresh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AcquireDecision {
    /// Permission granted; the caller owns the slot until `release`.
    Granted,
    /// Another refresh holds the slot right now.
    AlreadyRunning,
    /// The minimum spacing since the last start has not elapsed.
    Throttled { remaining: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RunState {
    Idle,
    Running,
}

struct SchedulerState {
    state: RunState,
    last_run: Option<DateTime<Utc>>,
}

/// Serializes refresh cycles and enforces a minimum spacing between their
/// start times. `last_run` is stamped on acquisition, not on completion, so
/// an attempt that fails immediately still counts against the spacing.
pub struct RefreshScheduler {
    state: RwLock<SchedulerState>,
    min_interval: Duration,
}

impl RefreshScheduler {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: RwLock::new(SchedulerState {
                state: RunState::Idle,
                last_run: None,
            }),
            min_interval,
        }
    }

    /// Try to claim the refresh slot at `now`.
    pub async fn try_acquire(&self, now: DateTime<Utc>) -> AcquireDecision {
        let mut state = self.state.write().await;

        if state.state == RunState::Running {
            return AcquireDecision::AlreadyRunning;
        }

        if let Some(last_run) = state.last_run {
            let elapsed = now - last_run;
            if elapsed < self.min_interval {
                return AcquireDecision::Throttled {
                    remaining: self.min_interval - elapsed,
                };
            }
        }

        state.state = RunState::Running;
        state.last_run = Some(now);
        debug!("🔓 Refresh-Slot vergeben");
        AcquireDecision::Granted
    }

    /// Return the slot. Safe to call regardless of how the refresh ended.
    pub async fn release(&self) {
        let mut state = self.state.write().await;
        state.state = RunState::Idle;
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.state == RunState::Running
    }
}
