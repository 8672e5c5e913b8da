use axum::{Router, middleware, routing::any};
use tower_http::trace::TraceLayer;

use crate::{
    auth::require_basic_auth, handlers::enqueue_caller,
    infra::app_state::AppState,
};

/// The scan trigger: `/`, any method, behind Basic authentication.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", any(enqueue_caller))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
