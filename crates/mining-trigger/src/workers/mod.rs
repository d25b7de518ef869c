//! Background workers driven by the orchestrator.

pub mod confirmation_worker;
pub mod idle_worker;

use tokio_util::sync::CancellationToken;

/// Sleep for `duration`, returning early if `cancel` fires. Used by both
/// workers' error backoff so a cancelled orchestrator shutdown is never
/// stuck waiting out a five-second cooldown.
pub(crate) async fn sleep_cancellable(duration: std::time::Duration, cancel: &CancellationToken) {
    tokio::select! {
        () = cancel.cancelled() => {}
        () = tokio::time::sleep(duration) => {}
    }
}
