//! Orchestrator: wires the scheduler, activity signal, proxy and workers
//! together and owns their lifecycle.

use crate::activity::ActivitySignal;
use crate::block_requester::BlockRequester;
use crate::chain::ChainId;
use crate::config::MiningTriggerConfig;
use crate::error::Error;
use crate::events::{BlockRequestReason, MtEvent};
use crate::proxy::{self, ProxyState};
use crate::scheduler::ConfirmationScheduler;
use crate::workers::{confirmation_worker, idle_worker};
use axum::Router;
use shared_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

enum LifecycleState {
    Idle,
    Running(RunningHandles),
}

struct RunningHandles {
    cancel: CancellationToken,
    confirmation_task: Option<JoinHandle<()>>,
    idle_task: Option<JoinHandle<()>>,
}

/// Owns the mining trigger's running state: the confirmation scheduler, the
/// activity signal, the event bus and the background workers.
pub struct Orchestrator {
    config: MiningTriggerConfig,
    scheduler: Arc<ConfirmationScheduler>,
    activity: Arc<ActivitySignal>,
    bus: Arc<EventBus<MtEvent>>,
    block_requester: Arc<dyn BlockRequester>,
    state: tokio::sync::Mutex<LifecycleState>,
}

impl Orchestrator {
    /// Construct an orchestrator. Does not start anything until [`Self::start`].
    pub fn new(config: MiningTriggerConfig, block_requester: Arc<dyn BlockRequester>) -> Self {
        Self {
            config,
            scheduler: Arc::new(ConfirmationScheduler::new()),
            activity: Arc::new(ActivitySignal::new()),
            bus: Arc::new(EventBus::new()),
            block_requester,
            state: tokio::sync::Mutex::new(LifecycleState::Idle),
        }
    }

    /// The event bus producers and consumers share. Subscribe on it before
    /// calling [`Self::start`] to avoid missing the initial burst.
    #[must_use]
    pub fn bus(&self) -> Arc<EventBus<MtEvent>> {
        Arc::clone(&self.bus)
    }

    /// Validate configuration, issue the startup burst across every chain,
    /// register the transaction proxy on `router`, and spawn the enabled
    /// workers. Returns the router with the proxy route merged in.
    ///
    /// Calling `start()` while already running is a no-op: it logs a
    /// warning and returns `router` unchanged.
    ///
    /// Only `Error::ConfigInvalid` is returned here. A transport failure in
    /// the startup burst is non-fatal: it is logged, an `error` event is
    /// emitted, and `start()` still completes.
    pub async fn start(&self, router: Router) -> Result<Router, Error> {
        self.config.validate()?;

        let mut state = self.state.lock().await;
        if matches!(*state, LifecycleState::Running(_)) {
            warn!("start() called while the orchestrator is already running; ignoring");
            return Ok(router);
        }

        match self.block_requester.request_blocks(&ChainId::all(), 2).await {
            Ok(()) => {
                self.bus.emit(MtEvent::BlocksRequested {
                    chains: ChainId::all(),
                    count: 2,
                    reason: BlockRequestReason::Initialization,
                });
            }
            Err(e) => {
                warn!(error = %e, "initialization block request failed");
                self.bus.emit(MtEvent::Error {
                    context: "orchestratorInitialization".into(),
                    chain_id: None,
                });
            }
        }

        let proxy_state = Arc::new(ProxyState {
            http_client: reqwest::Client::new(),
            chainweb_service_endpoint: self.config.chainweb_service_endpoint.clone(),
            scheduler: Arc::clone(&self.scheduler),
            activity: Arc::clone(&self.activity),
            bus: Arc::clone(&self.bus),
            default_confirmation_count: self.config.default_confirmation_count,
            transaction_batch_period: Duration::from_secs_f64(
                self.config.transaction_batch_period_sec,
            ),
        });
        let router = router.merge(proxy::router(proxy_state));

        let cancel = CancellationToken::new();

        let confirmation_task = if self.config.disable_confirmation_worker {
            None
        } else {
            Some(tokio::spawn(confirmation_worker::run(
                Arc::clone(&self.scheduler),
                Arc::clone(&self.activity),
                Arc::clone(&self.block_requester),
                Arc::clone(&self.bus),
                Duration::from_secs_f64(self.config.confirmation_trigger_period_sec),
                Duration::from_secs_f64(self.config.mining_cooldown_sec),
                cancel.clone(),
            )))
        };

        let idle_task = if self.config.disable_idle_worker {
            None
        } else {
            Some(tokio::spawn(idle_worker::run(
                Arc::clone(&self.activity),
                Arc::clone(&self.block_requester),
                Arc::clone(&self.bus),
                self.config.idle_trigger_period_sec,
                cancel.clone(),
            )))
        };

        *state = LifecycleState::Running(RunningHandles {
            cancel,
            confirmation_task,
            idle_task,
        });
        drop(state);

        info!("mining trigger started");
        self.bus.emit(MtEvent::Started);

        Ok(router)
    }

    /// Cancel both workers and wait for them to exit. Idempotent: calling
    /// `stop()` when already idle is a no-op and emits nothing.
    pub async fn stop(&self) {
        let handles = {
            let mut state = self.state.lock().await;
            match std::mem::replace(&mut *state, LifecycleState::Idle) {
                LifecycleState::Running(handles) => Some(handles),
                LifecycleState::Idle => None,
            }
        };

        let Some(handles) = handles else {
            return;
        };

        handles.cancel.cancel();
        if let Some(task) = handles.confirmation_task {
            let _ = task.await;
        }
        if let Some(task) = handles.idle_task {
            let _ = task.await;
        }

        info!("mining trigger stopped");
        self.bus.emit(MtEvent::Stopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRequester {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BlockRequester for CountingRequester {
        async fn request_blocks(&self, _chains: &[ChainId], _count: u32) -> Result<(), Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingRequester;

    #[async_trait]
    impl BlockRequester for FailingRequester {
        async fn request_blocks(&self, _chains: &[ChainId], _count: u32) -> Result<(), Error> {
            Err(Error::InvalidState("injected failure".into()))
        }
    }

    fn config() -> MiningTriggerConfig {
        MiningTriggerConfig {
            mining_client_url: "http://localhost:1848".parse().unwrap(),
            chainweb_service_endpoint: "http://localhost:1848".parse().unwrap(),
            idle_trigger_period_sec: 5.0,
            confirmation_trigger_period_sec: 2.0,
            transaction_batch_period_sec: 0.05,
            mining_cooldown_sec: 0.0,
            default_confirmation_count: 5,
            disable_idle_worker: true,
            disable_confirmation_worker: true,
        }
    }

    #[tokio::test]
    async fn test_start_issues_initialization_burst() {
        let requester = Arc::new(CountingRequester {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(config(), requester.clone());
        let router = orchestrator.start(Router::new()).await.unwrap();
        drop(router);
        assert_eq!(requester.calls.load(Ordering::SeqCst), 1);
        orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_double_start_is_noop() {
        let requester = Arc::new(CountingRequester {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(config(), requester.clone());
        orchestrator.start(Router::new()).await.unwrap();
        orchestrator.start(Router::new()).await.unwrap();
        assert_eq!(requester.calls.load(Ordering::SeqCst), 1);
        orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_double_stop_is_noop() {
        let requester = Arc::new(CountingRequester {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(config(), requester.clone());
        orchestrator.start(Router::new()).await.unwrap();
        orchestrator.stop().await;
        orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_startup_burst_failure_is_non_fatal() {
        let orchestrator = Orchestrator::new(config(), Arc::new(FailingRequester));
        let result = orchestrator.start(Router::new()).await;
        assert!(result.is_ok());
        orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_on_start() {
        let mut cfg = config();
        cfg.idle_trigger_period_sec = 0.0;
        let requester = Arc::new(CountingRequester {
            calls: AtomicUsize::new(0),
        });
        let orchestrator = Orchestrator::new(cfg, requester);
        let result = orchestrator.start(Router::new()).await;
        assert!(result.is_err());
    }
}
