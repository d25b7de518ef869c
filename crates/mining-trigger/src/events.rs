//! The mining trigger's typed event map, carried over [`shared_bus::EventBus`].

use crate::chain::ChainId;
use crate::scheduler::ConfirmationDemand;
use bytes::Bytes;

/// Why a `blocksRequested` burst was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRequestReason {
    /// The orchestrator's startup burst across every chain.
    Initialization,
    /// A confirmation worker burst following a scheduled demand.
    Confirmation,
    /// An idle worker's single-chain keepalive request.
    Idle,
}

/// Every event the mining trigger can emit.
#[derive(Debug, Clone)]
pub enum MtEvent {
    /// The orchestrator finished `start()` and both workers (if enabled) are
    /// running.
    Started,
    /// The orchestrator finished `stop()`; both workers have exited.
    Stopped,
    /// Either worker observed activity (a transaction was proxied, or the
    /// idle worker's own timer fired).
    Activity,
    /// A transaction body arrived at the proxy, before forwarding.
    TransactionReceived {
        network_id: String,
        chain_id: ChainId,
        body: Bytes,
    },
    /// The proxy forwarded a transaction downstream and got a response.
    TransactionProxied {
        network_id: String,
        chain_id: ChainId,
        status: u16,
        response_body: Bytes,
    },
    /// The confirmation scheduler's batching window drained into a demand.
    ConfirmationTrigger { demand: ConfirmationDemand },
    /// A `make-blocks` request was issued.
    BlocksRequested {
        chains: Vec<ChainId>,
        count: u32,
        reason: BlockRequestReason,
    },
    /// A recoverable error occurred in a worker or the proxy.
    Error {
        context: String,
        chain_id: Option<ChainId>,
    },
}
