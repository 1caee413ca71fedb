//! Call setup: tells the telephony provider where to stream call audio.

use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Path of the media stream WebSocket.
pub const MEDIA_STREAM_PATH: &str = "/media-stream";

/// Answer an incoming call with instructions to connect a media stream.
///
/// The stream host is the configured public host, or the request `Host`
/// header without its port.
pub async fn incoming_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let host = match state.config.public_host.as_deref() {
        Some(public_host) => public_host.to_string(),
        None => request_host(&headers)?,
    };

    if !is_valid_host(&host) {
        return Err(AppError::BadRequest(format!("Invalid host '{host}'")));
    }

    info!(host = %host, "Received incoming call request");

    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        build_stream_twiml(&host),
    )
        .into_response())
}

/// TwiML connecting the call to the media stream endpoint on `host`.
pub fn build_stream_twiml(host: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <Response><Connect><Stream url=\"wss://{host}{MEDIA_STREAM_PATH}\" /></Connect></Response>"
    )
}

fn request_host(headers: &HeaderMap) -> AppResult<String> {
    let raw = headers
        .get(header::HOST)
        .ok_or_else(|| AppError::BadRequest("Missing Host header".to_string()))?
        .to_str()
        .map_err(|_| AppError::BadRequest("Host header is not valid ASCII".to_string()))?;

    Ok(strip_port(raw.trim()).to_string())
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal
        return host.find(']').map_or(host, |end| &host[..=end]);
    }
    host.split(':').next().unwrap_or(host)
}

fn is_valid_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '[' | ']'))
}
