use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use super::{
    credentials::BasicCredentials,
    gate::{CredentialGate, GateDecision},
};
use crate::{handlers::peer_ip, infra::app_state::AppState};

/// Wraps a handler so it only runs for requests carrying the configured
/// Basic credentials. Everything else gets a 401 challenge.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let presented = BasicCredentials::from_headers(request.headers());

    match state.gate.verify(presented.as_ref()) {
        GateDecision::Allow => {
            debug!(peer = ?peer_ip(&request), "credentials accepted");
            next.run(request).await
        }
        GateDecision::Deny => {
            let user = presented
                .as_ref()
                .map(|creds| creds.username.as_str())
                .unwrap_or("<none>");
            info!(
                user = %user,
                peer = ?peer_ip(&request),
                "rejected credentials"
            );
            unauthorized(&state.gate)
        }
    }
}

pub fn unauthorized(gate: &CredentialGate) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, gate.challenge().clone())],
        "Unauthorized.\n",
    )
        .into_response()
}
