//! Idle worker: requests a single keepalive block on a random chain whenever
//! no activity has been observed for a dampened period.

use super::sleep_cancellable;
use crate::activity::{ActivityResult, ActivitySignal};
use crate::block_requester::BlockRequester;
use crate::chain::ChainId;
use crate::error::Error;
use crate::events::{BlockRequestReason, MtEvent};
use shared_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Dampening factor applied to the configured idle period so the worker
/// wakes a little earlier than the nominal period, smoothing out the
/// thundering-herd effect of many devnet instances sharing a clock.
pub const IDLE_DAMPENING_FACTOR: f64 = 0.616;

enum WorkerOutcome {
    Aborted,
    Continued,
}

/// Run the idle worker loop until `cancel` fires.
pub async fn run(
    activity: Arc<ActivitySignal>,
    block_requester: Arc<dyn BlockRequester>,
    bus: Arc<EventBus<MtEvent>>,
    idle_period_sec: f64,
    cancel: CancellationToken,
) {
    let period = Duration::from_secs_f64((idle_period_sec * IDLE_DAMPENING_FACTOR).max(0.0));

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match process_once(&activity, block_requester.as_ref(), &bus, period, &cancel).await {
            Ok(WorkerOutcome::Aborted) => break,
            Ok(WorkerOutcome::Continued) => {}
            Err(e) => {
                warn!(error = %e, "idle worker error");
                bus.emit(MtEvent::Error {
                    context: "idleWorker".into(),
                    chain_id: None,
                });
                sleep_cancellable(ERROR_BACKOFF, &cancel).await;
            }
        }
    }
}

async fn process_once(
    activity: &ActivitySignal,
    block_requester: &(dyn BlockRequester + 'static),
    bus: &EventBus<MtEvent>,
    period: Duration,
    cancel: &CancellationToken,
) -> Result<WorkerOutcome, Error> {
    match activity.wait(period, cancel).await {
        ActivityResult::Aborted => Ok(WorkerOutcome::Aborted),
        ActivityResult::Activity => {
            bus.emit(MtEvent::Activity);
            Ok(WorkerOutcome::Continued)
        }
        ActivityResult::Timeout => {
            let chain = ChainId::random();
            block_requester.request_blocks(&[chain], 1).await?;
            bus.emit(MtEvent::BlocksRequested {
                chains: vec![chain],
                count: 1,
                reason: BlockRequestReason::Idle,
            });
            Ok(WorkerOutcome::Continued)
        }
    }
}
