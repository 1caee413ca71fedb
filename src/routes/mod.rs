pub mod api;
pub mod media_stream;

use axum::Router;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;

/// Build the complete application router
pub fn create_app(state: Arc<AppState>) -> Router {
    // Security headers
    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ));

    api::create_api_router()
        .merge(media_stream::create_media_stream_router())
        .with_state(state)
        .layer(security_headers)
}
