use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    response::Html,
};
use scanback_core::ScanRequest;
use tracing::{error, info};

use crate::{
    errors::{AppError, AppResult},
    infra::app_state::AppState,
    render,
};

/// Transport-level peer address. Forwarding headers are never consulted.
pub fn peer_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

/// Queue the caller for a scan and acknowledge immediately.
pub async fn enqueue_caller(
    State(state): State<AppState>,
    request: Request,
) -> AppResult<Html<String>> {
    let Some(peer) = peer_ip(&request) else {
        error!(
            uri = %request.uri(),
            "connection info missing; cannot determine caller address"
        );
        return Err(AppError::internal("caller address unavailable"));
    };

    let scan = ScanRequest::new(peer);
    let pending = state.queue.enqueue(scan).inspect_err(|err| {
        error!(target = %scan, error = %err, "failed to queue scan");
    })?;

    info!(target = %scan, pending, "added to scan queue");
    Ok(Html(render::queued_page(scan.target())))
}
