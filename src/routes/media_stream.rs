//! Media stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::call::MEDIA_STREAM_PATH;
use crate::handlers::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media stream WebSocket router
///
/// # Endpoint
///
/// `GET /media-stream` - WebSocket upgrade used by the telephony provider
///
/// # Protocol
///
/// The provider sends JSON events tagged by `event`: `connected`, `start`,
/// `media` (base64 G.711 u-law audio), `mark` and `stop`. The server answers
/// with `media`, `mark`, `clear` and `stop` events addressed by `streamSid`.
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(MEDIA_STREAM_PATH, get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
