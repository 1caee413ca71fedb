//! Barge-in: truncating an assistant response the caller talks over.

use tracing::debug;

use super::state::RelayState;
use crate::core::realtime::ClientEvent;
use crate::core::telephony::TelephonyCommand;

/// Commands needed to cut off the in-flight response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BargeIn {
    pub response_id: String,
    pub item_id: String,
    /// Milliseconds of the response the caller actually heard.
    pub audio_end_ms: u64,
    pub stream_id: Option<String>,
}

impl BargeIn {
    pub fn truncate_command(&self) -> ClientEvent {
        ClientEvent::truncate(self.item_id.clone(), self.audio_end_ms)
    }

    /// `clear` for the telephony side, if the stream is known.
    pub fn clear_command(&self) -> Option<TelephonyCommand> {
        self.stream_id.as_deref().map(TelephonyCommand::clear)
    }
}

/// Decide whether caller speech interrupts the in-flight response.
///
/// Returns `None` and leaves the state untouched when no response is in flight
/// or none of its audio has been queued downstream. Otherwise the response and
/// all outstanding marks are dropped from `state`.
pub fn plan_barge_in(state: &mut RelayState) -> Option<BargeIn> {
    let started_at_ms = state.in_flight()?.started_at_ms;

    if state.pending_marks() == 0 {
        debug!("Speech started with no audio queued downstream, nothing to truncate");
        return None;
    }

    let audio_end_ms = state
        .latest_media_timestamp()
        .saturating_sub(started_at_ms);
    let stream_id = state.stream_id().map(str::to_string);
    let response = state.reset_response()?;

    Some(BargeIn {
        response_id: response.response_id,
        item_id: response.item_id,
        audio_end_ms,
        stream_id,
    })
}
