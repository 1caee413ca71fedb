use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, call};
use crate::state::AppState;
use std::sync::Arc;

/// Create the router for the status page and call setup
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::index))
        .route(
            "/incoming-call",
            get(call::incoming_call).post(call::incoming_call),
        )
        .layer(TraceLayer::new_for_http())
}
