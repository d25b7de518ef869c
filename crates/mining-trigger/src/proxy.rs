//! Transaction proxy: accepts `/chainweb/.../pact/api/v1/send` requests,
//! forwards them to the real Chainweb service, and schedules confirmations
//! for accepted transactions.

use crate::activity::ActivitySignal;
use crate::chain::ChainId;
use crate::events::MtEvent;
use crate::scheduler::ConfirmationScheduler;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use shared_bus::EventBus;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Path this proxy registers on the injected router.
pub const SEND_ROUTE: &str = "/chainweb/0.0/:network_id/chain/:chain_id/pact/api/v1/send";

/// Request headers stripped before forwarding downstream; these are
/// connection-scoped and meaningless once copied across a new client/server
/// pair.
const HOP_BY_HOP: &[&str] = &["host", "content-length", "transfer-encoding", "connection"];

/// Response headers stripped before copying the downstream response back to
/// the client, per spec: `transfer-encoding` (connection-scoped, and this
/// response is reframed through `reqwest`'s own body) and
/// `access-control-allow-origin` (the downstream's CORS policy must not leak
/// through the proxy as if it were this service's own).
const RESPONSE_STRIPPED: &[&str] = &["transfer-encoding", "access-control-allow-origin"];

/// Shared state for the proxy handler.
pub struct ProxyState {
    pub http_client: reqwest::Client,
    pub chainweb_service_endpoint: Url,
    pub scheduler: Arc<ConfirmationScheduler>,
    pub activity: Arc<ActivitySignal>,
    pub bus: Arc<EventBus<MtEvent>>,
    pub default_confirmation_count: u32,
    pub transaction_batch_period: Duration,
}

/// Build the proxy's sub-router, ready to be merged onto the caller's app.
pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route(SEND_ROUTE, post(send_handler))
        .with_state(state)
}

async fn send_handler(
    State(state): State<Arc<ProxyState>>,
    Path((network_id, chain_id_raw)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let chain_id: ChainId = match chain_id_raw.parse() {
        Ok(c) => c,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid chain id").into_response(),
    };

    state.bus.emit(MtEvent::TransactionReceived {
        network_id: network_id.clone(),
        chain_id,
        body: body.clone(),
    });

    let downstream_url = match state.chainweb_service_endpoint.join(&format!(
        "chainweb/0.0/{network_id}/chain/{chain_id}/pact/api/v1/send"
    )) {
        Ok(url) => url,
        Err(_) => return (StatusCode::BAD_REQUEST, "invalid network id").into_response(),
    };

    let mut request = state.http_client.post(downstream_url).body(body);
    for (name, value) in headers.iter() {
        if HOP_BY_HOP.contains(&name.as_str()) {
            continue;
        }
        request = request.header(name, value);
    }

    let downstream_response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            state.bus.emit(MtEvent::Error {
                context: "transactionProxy".into(),
                chain_id: Some(chain_id),
            });
            return synthetic_error_response(&e);
        }
    };

    let status = downstream_response.status();
    let mut response_headers = HeaderMap::new();
    for (name, value) in downstream_response.headers() {
        if RESPONSE_STRIPPED.contains(&name.as_str()) {
            continue;
        }
        response_headers.insert(name.clone(), value.clone());
    }

    let response_body = match downstream_response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            state.bus.emit(MtEvent::Error {
                context: "transactionProxy".into(),
                chain_id: Some(chain_id),
            });
            return synthetic_error_response(&e);
        }
    };

    state.bus.emit(MtEvent::TransactionProxied {
        network_id,
        chain_id,
        status: status.as_u16(),
        response_body: response_body.clone(),
    });

    if status == StatusCode::OK && state.default_confirmation_count > 0 {
        state
            .scheduler
            .push(state.transaction_batch_period, chain_id, state.default_confirmation_count);
        state.activity.signal();
    }

    let mut builder = Response::builder().status(status);
    if let Some(h) = builder.headers_mut() {
        *h = response_headers;
    }
    builder
        .body(axum::body::Body::from(response_body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

fn synthetic_error_response(err: &reqwest::Error) -> Response {
    let status = err
        .status()
        .map(|s| s.as_u16())
        .unwrap_or(502);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = serde_json::json!({
        "error": "transaction proxy failed",
        "detail": err.to_string(),
    });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_route_has_expected_segments() {
        assert!(SEND_ROUTE.contains(":network_id"));
        assert!(SEND_ROUTE.contains(":chain_id"));
        assert!(SEND_ROUTE.ends_with("/send"));
    }

    #[test]
    fn test_hop_by_hop_headers_list_is_lowercase() {
        for h in HOP_BY_HOP {
            assert_eq!(*h, h.to_lowercase());
        }
    }

    #[test]
    fn test_response_stripped_headers_list_is_lowercase() {
        for h in RESPONSE_STRIPPED {
            assert_eq!(*h, h.to_lowercase());
        }
    }

    #[test]
    fn test_response_stripped_includes_cors_and_transfer_encoding() {
        assert!(RESPONSE_STRIPPED.contains(&"access-control-allow-origin"));
        assert!(RESPONSE_STRIPPED.contains(&"transfer-encoding"));
    }
}
