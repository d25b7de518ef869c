//! Confirmation worker: drains the [`ConfirmationScheduler`] and issues a
//! `make-blocks` burst for each demand.

use super::sleep_cancellable;
use crate::activity::ActivitySignal;
use crate::block_requester::BlockRequester;
use crate::error::Error;
use crate::events::{BlockRequestReason, MtEvent};
use crate::scheduler::{ConfirmationDemand, ConfirmationScheduler};
use shared_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Run the confirmation worker loop until `cancel` fires.
pub async fn run(
    scheduler: Arc<ConfirmationScheduler>,
    activity: Arc<ActivitySignal>,
    block_requester: Arc<dyn BlockRequester>,
    bus: Arc<EventBus<MtEvent>>,
    trigger_period: Duration,
    mining_cooldown: Duration,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let outcome = process_once(
            &scheduler,
            &activity,
            block_requester.as_ref(),
            &bus,
            trigger_period,
            mining_cooldown,
            &cancel,
        )
        .await;

        if let Err(e) = outcome {
            warn!(error = %e, "confirmation worker error");
            bus.emit(MtEvent::Error {
                context: "confirmationWorker".into(),
                chain_id: None,
            });
            sleep_cancellable(ERROR_BACKOFF, &cancel).await;
        }
    }
}

async fn process_once(
    scheduler: &ConfirmationScheduler,
    activity: &ActivitySignal,
    block_requester: &(dyn BlockRequester + 'static),
    bus: &EventBus<MtEvent>,
    trigger_period: Duration,
    mining_cooldown: Duration,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let demand: ConfirmationDemand = scheduler.wait_next_demands(trigger_period, cancel).await;

    if cancel.is_cancelled() {
        return Ok(());
    }
    activity.signal();

    if demand.is_empty() {
        return Ok(());
    }

    bus.emit(MtEvent::ConfirmationTrigger {
        demand: demand.clone(),
    });

    for i in 0..demand.confirmations {
        if cancel.is_cancelled() {
            break;
        }
        block_requester
            .request_blocks(&demand.chains, 1)
            .await?;
        bus.emit(MtEvent::BlocksRequested {
            chains: demand.chains.clone(),
            count: 1,
            reason: BlockRequestReason::Confirmation,
        });
        if i + 1 < demand.confirmations {
            sleep_cancellable(mining_cooldown, cancel).await;
        }
    }

    Ok(())
}
