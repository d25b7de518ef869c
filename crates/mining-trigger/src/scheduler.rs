//! Confirmation scheduler.
//!
//! Accumulates per-chain pending confirmation counts and coalesces them into
//! a single [`ConfirmationDemand`] once a batching window elapses. Producers
//! (the transaction proxy) call [`ConfirmationScheduler::push`] from many
//! concurrent requests; one consumer (the confirmation worker) calls
//! [`ConfirmationScheduler::wait_next_demands`] in a loop.

use crate::chain::ChainId;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A coalesced confirmation request: one burst of `confirmations` blocks
/// should be requested across every chain in `chains`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationDemand {
    pub chains: Vec<ChainId>,
    pub confirmations: u32,
}

impl ConfirmationDemand {
    /// A demand carrying nothing to do.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            chains: Vec::new(),
            confirmations: 0,
        }
    }

    /// Whether this demand has no chains to confirm.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

struct SchedulerState {
    pending: HashMap<ChainId, u32>,
    next_drain_at: Option<Instant>,
}

/// Batches per-chain confirmation demand behind a short window.
pub struct ConfirmationScheduler {
    state: Mutex<SchedulerState>,
    notify: Notify,
}

impl ConfirmationScheduler {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                pending: HashMap::new(),
                next_drain_at: None,
            }),
            notify: Notify::new(),
        }
    }

    /// Record that `chain` needs `count` more confirmations. Opens a new
    /// batching window of `batch_window` if one is not already running.
    pub fn push(&self, batch_window: Duration, chain: ChainId, count: u32) {
        if count == 0 {
            return;
        }
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            *state.pending.entry(chain).or_insert(0) += count;
            if state.next_drain_at.is_none() {
                state.next_drain_at = Some(Instant::now() + batch_window);
            }
        }
        self.notify.notify_one();
    }

    /// Wait for the earliest of: the batching window's deadline, `max_wait`
    /// elapsing while some demand exists, or cancellation. Returns an empty
    /// demand if `max_wait` elapses with nothing pending, or if cancelled.
    pub async fn wait_next_demands(
        &self,
        max_wait: Duration,
        cancel: &CancellationToken,
    ) -> ConfirmationDemand {
        let overall_deadline = Instant::now() + max_wait;

        loop {
            let wake_at = {
                let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
                match state.next_drain_at {
                    Some(drain_at) => drain_at.min(overall_deadline),
                    None => overall_deadline,
                }
            };

            tokio::select! {
                () = cancel.cancelled() => return ConfirmationDemand::empty(),
                () = tokio::time::sleep_until(wake_at) => {}
                () = self.notify.notified() => {}
            }

            let now = Instant::now();
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let have_demand = !state.pending.is_empty();
            let past_drain_deadline = state.next_drain_at.is_some_and(|t| now >= t);
            let past_max_wait = now >= overall_deadline;

            if past_drain_deadline || (past_max_wait && have_demand) {
                return Self::drain(&mut state);
            }
            if past_max_wait {
                return ConfirmationDemand::empty();
            }
            // Woken by a push that didn't yet cross either deadline; loop.
        }
    }

    fn drain(state: &mut SchedulerState) -> ConfirmationDemand {
        let mut chains: Vec<ChainId> = state.pending.keys().copied().collect();
        chains.sort_unstable();
        let confirmations = state.pending.values().copied().max().unwrap_or(0);
        state.pending.clear();
        state.next_drain_at = None;
        ConfirmationDemand {
            chains,
            confirmations,
        }
    }
}

impl Default for ConfirmationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: u8) -> ChainId {
        ChainId::new(n).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drains_on_batch_window() {
        let scheduler = ConfirmationScheduler::new();
        scheduler.push(Duration::from_millis(50), chain(0), 3);

        let cancel = CancellationToken::new();
        let demand = scheduler
            .wait_next_demands(Duration::from_secs(10), &cancel)
            .await;

        assert_eq!(demand.chains, vec![chain(0)]);
        assert_eq!(demand.confirmations, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_coalesces_max_confirmations_across_chains() {
        let scheduler = ConfirmationScheduler::new();
        scheduler.push(Duration::from_millis(50), chain(0), 2);
        scheduler.push(Duration::from_millis(50), chain(1), 5);
        scheduler.push(Duration::from_millis(50), chain(2), 1);

        let cancel = CancellationToken::new();
        let demand = scheduler
            .wait_next_demands(Duration::from_secs(10), &cancel)
            .await;

        assert_eq!(demand.chains, vec![chain(0), chain(1), chain(2)]);
        assert_eq!(demand.confirmations, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_when_max_wait_elapses_with_nothing_pending() {
        let scheduler = ConfirmationScheduler::new();
        let cancel = CancellationToken::new();
        let demand = scheduler
            .wait_next_demands(Duration::from_millis(20), &cancel)
            .await;
        assert!(demand.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_returns_empty_immediately() {
        let scheduler = ConfirmationScheduler::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let demand = scheduler
            .wait_next_demands(Duration::from_secs(60), &cancel)
            .await;
        assert!(demand.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_push_after_drain_opens_new_window() {
        let scheduler = ConfirmationScheduler::new();
        let cancel = CancellationToken::new();

        scheduler.push(Duration::from_millis(10), chain(5), 1);
        let first = scheduler
            .wait_next_demands(Duration::from_secs(10), &cancel)
            .await;
        assert_eq!(first.confirmations, 1);

        scheduler.push(Duration::from_millis(10), chain(5), 4);
        let second = scheduler
            .wait_next_demands(Duration::from_secs(10), &cancel)
            .await;
        assert_eq!(second.confirmations, 4);
    }
}
