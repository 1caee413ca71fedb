//! Media stream WebSocket handler
//!
//! Each accepted WebSocket is one phone call. The handler connects a fresh
//! realtime AI session for it and runs a [`RelaySession`] until the call ends.

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::core::realtime::{OpenAIRealtime, RealtimeLink};
use crate::core::relay::{CallSummary, RelayError, RelaySession, TelephonyLink};
use crate::core::telephony::telephony_link;
use crate::state::AppState;

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// Upgrade the telephony provider's connection and relay the call.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!("Media stream WebSocket upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_stream(socket, state))
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>) {
    let call_id = Uuid::new_v4().to_string();
    info!(call_id = %call_id, "Media stream connection accepted");

    match run_call(&call_id, telephony_link(socket), &state).await {
        Ok(summary) => info!(
            call_id = %call_id,
            reason = ?summary.reason,
            lines = summary.transcript.len(),
            "Call finished"
        ),
        Err(e) => error!(call_id = %call_id, "Call aborted: {}", e),
    }
}

/// Connect the AI side for one call and relay until it ends.
///
/// If the realtime session cannot be opened the telephony link is closed.
pub async fn run_call(
    call_id: &str,
    telephony: TelephonyLink,
    state: &AppState,
) -> Result<CallSummary, RelayError> {
    let (client, ai) = match connect_realtime(state).await {
        Ok(connected) => connected,
        Err(e) => {
            if let Err(close_err) = telephony.sender.close().await {
                debug!(call_id, "Telephony link already closed: {}", close_err);
            }
            return Err(e);
        }
    };

    let session = RelaySession::new(
        call_id,
        state.config.call.clone(),
        state.transcript_sink.clone(),
    );
    session.start(telephony, ai, client.handshake()).await
}

async fn connect_realtime(state: &AppState) -> Result<(OpenAIRealtime, RealtimeLink), RelayError> {
    let api_key = state.config.openai_api_key.clone().unwrap_or_default();
    let client = OpenAIRealtime::new(api_key, state.config.realtime.clone())?;
    let link = client.connect().await?;
    Ok((client, link))
}
