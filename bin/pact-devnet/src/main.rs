//! Composition root: wires the mining trigger's orchestrator and the
//! prelude cache's resolver around one `axum` app and one `reqwest`
//! client, then runs until `SIGINT`.

mod config;

use axum::routing::get;
use axum::Router;
use config::DevnetConfig;
use mining_trigger::{BlockRequester, HttpBlockRequester, MtEvent, Orchestrator};
use prelude_cache::{Git2Fetcher, Prelude, PreludeResolver};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = DevnetConfig::load()?;

    let preludes: Vec<Prelude> = config
        .preludes
        .iter()
        .cloned()
        .map(Prelude::from)
        .collect();

    if !preludes.is_empty() {
        let resolver = PreludeResolver::new(Git2Fetcher::new(), &config.preludes_dir);
        let names: Vec<&str> = preludes.iter().map(|p| p.name.as_str()).collect();
        if resolver.cache().should_download_preludes(names) {
            info!("materialising preludes into {:?}", config.preludes_dir);
            resolver.download_all_preludes(&preludes)?;
        } else {
            info!("preludes already cached, skipping download");
        }
    }

    let http_client = reqwest::Client::new();
    let block_requester: Arc<dyn BlockRequester> = Arc::new(HttpBlockRequester::new(
        http_client,
        &config.mining_trigger.mining_client_url,
    )?);

    let orchestrator = Arc::new(Orchestrator::new(
        config.mining_trigger.clone(),
        block_requester,
    ));

    let bus = orchestrator.bus();
    bus.subscribe(|event: &MtEvent| log_event(event));

    let router = Router::new().route("/healthz", get(|| async { "ok" }));
    let router = orchestrator.start(router).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "pact-devnet listening");

    tokio::select! {
        result = axum::serve(listener, router) => {
            if let Err(e) = result {
                error!(error = %e, "http server exited with error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
    }

    orchestrator.stop().await;
    Ok(())
}

fn log_event(event: &MtEvent) {
    match event {
        MtEvent::Started => info!("mining trigger started"),
        MtEvent::Stopped => info!("mining trigger stopped"),
        MtEvent::Activity => {}
        MtEvent::TransactionReceived {
            network_id,
            chain_id,
            ..
        } => {
            tracing::debug!(%network_id, %chain_id, "transaction received");
        }
        MtEvent::TransactionProxied {
            network_id,
            chain_id,
            status,
            ..
        } => {
            tracing::debug!(%network_id, %chain_id, status, "transaction proxied");
        }
        MtEvent::ConfirmationTrigger { demand } => {
            tracing::debug!(chains = ?demand.chains, confirmations = demand.confirmations, "confirmation trigger");
        }
        MtEvent::BlocksRequested {
            chains,
            count,
            reason,
        } => {
            tracing::debug!(chains = ?chains, count, reason = ?reason, "blocks requested");
        }
        MtEvent::Error { context, chain_id } => {
            warn!(context, chain_id = ?chain_id, "mining trigger error event");
        }
    }
}
