//! Activity signal: a single edge-triggered waitable condition shared across
//! the idle worker and whatever produces activity (the transaction proxy,
//! the confirmation worker).

use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Outcome of waiting on an [`ActivitySignal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityResult {
    /// A signal arrived before the timeout.
    Activity,
    /// The timeout elapsed with no signal.
    Timeout,
    /// The wait was cancelled.
    Aborted,
}

/// A `tokio::sync::Notify` gives exactly the semantics the spec calls for:
/// multiple concurrent `signal()` calls collapse into a single wakeup if no
/// one is waiting yet, and `wait()` consumes at most one permit per call.
pub struct ActivitySignal {
    notify: Notify,
}

impl ActivitySignal {
    /// Create a signal with no pending activity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            notify: Notify::new(),
        }
    }

    /// Record that activity happened, waking one waiter (or priming the next
    /// `wait()` call if nobody is waiting yet).
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    /// Wait for activity, a timeout, or cancellation, whichever comes first.
    pub async fn wait(&self, timeout: Duration, cancel: &CancellationToken) -> ActivityResult {
        tokio::select! {
            () = cancel.cancelled() => ActivityResult::Aborted,
            () = self.notify.notified() => ActivityResult::Activity,
            () = tokio::time::sleep(timeout) => ActivityResult::Timeout,
        }
    }
}

impl Default for ActivitySignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_with_no_signal() {
        let signal = ActivitySignal::new();
        let cancel = CancellationToken::new();
        let result = signal.wait(Duration::from_millis(10), &cancel).await;
        assert_eq!(result, ActivityResult::Timeout);
    }

    #[tokio::test]
    async fn test_signal_before_wait_is_observed() {
        let signal = ActivitySignal::new();
        let cancel = CancellationToken::new();
        signal.signal();
        let result = signal.wait(Duration::from_secs(60), &cancel).await;
        assert_eq!(result, ActivityResult::Activity);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_wait() {
        let signal = ActivitySignal::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = signal.wait(Duration::from_secs(60), &cancel).await;
        assert_eq!(result, ActivityResult::Aborted);
    }

    #[tokio::test]
    async fn test_concurrent_signals_collapse_to_one_wakeup() {
        let signal = ActivitySignal::new();
        signal.signal();
        signal.signal();
        signal.signal();
        let cancel = CancellationToken::new();
        // Only one permit should be consumed by this wait.
        assert_eq!(
            signal.wait(Duration::from_secs(60), &cancel).await,
            ActivityResult::Activity
        );
    }
}
