//! Mutable per-call relay state.

use std::collections::VecDeque;

use tracing::trace;

use crate::core::telephony::{RESPONSE_PART_MARK, TelephonyCommand};

/// Assistant response currently being played to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightResponse {
    pub response_id: String,
    /// Conversation item carrying the audio; truncation is addressed to it.
    pub item_id: String,
    /// Media clock value when the response first became audible.
    pub started_at_ms: u64,
}

/// Stream identity, media clock, in-flight response and outstanding marks of one call.
///
/// The in-flight response and its start timestamp live in one `Option`, so they
/// are always set and cleared together.
#[derive(Debug, Default)]
pub struct RelayState {
    stream_id: Option<String>,
    latest_media_timestamp: u64,
    in_flight: Option<InFlightResponse>,
    pending_marks: VecDeque<&'static str>,
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.stream_id.as_deref()
    }

    /// Record the stream identity. Returns false if one was already recorded; the
    /// first value is kept.
    pub fn set_stream_id(&mut self, stream_id: impl Into<String>) -> bool {
        if self.stream_id.is_some() {
            return false;
        }
        self.stream_id = Some(stream_id.into());
        true
    }

    pub fn latest_media_timestamp(&self) -> u64 {
        self.latest_media_timestamp
    }

    pub fn record_media(&mut self, timestamp_ms: u64) {
        self.latest_media_timestamp = timestamp_ms;
    }

    pub fn in_flight(&self) -> Option<&InFlightResponse> {
        self.in_flight.as_ref()
    }

    pub fn pending_marks(&self) -> usize {
        self.pending_marks.len()
    }

    /// Track one chunk of assistant audio and build the telephony commands for it.
    ///
    /// Yields a `media` command followed by a `mark` command, or nothing when the
    /// stream has not started. The response start timestamp is taken from the
    /// media clock on the first chunk and kept for later chunks.
    pub fn record_audio_delta(
        &mut self,
        response_id: &str,
        item_id: &str,
        payload: String,
    ) -> Vec<TelephonyCommand> {
        let started_at_ms = self
            .in_flight
            .as_ref()
            .map_or(self.latest_media_timestamp, |current| current.started_at_ms);

        self.in_flight = Some(InFlightResponse {
            response_id: response_id.to_string(),
            item_id: item_id.to_string(),
            started_at_ms,
        });

        let Some(stream_id) = self.stream_id.as_deref() else {
            trace!("Audio delta before stream start, not relayed");
            return Vec::new();
        };

        self.pending_marks.push_back(RESPONSE_PART_MARK);
        vec![
            TelephonyCommand::media(stream_id, payload),
            TelephonyCommand::response_part_mark(stream_id),
        ]
    }

    /// Pop the oldest outstanding mark. Returns false if none was outstanding.
    pub fn acknowledge(&mut self) -> bool {
        self.pending_marks.pop_front().is_some()
    }

    /// Forget the in-flight response and every outstanding mark.
    pub fn reset_response(&mut self) -> Option<InFlightResponse> {
        self.pending_marks.clear();
        self.in_flight.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_is_set_once() {
        let mut state = RelayState::new();
        assert!(state.stream_id().is_none());

        assert!(state.set_stream_id("CA123"));
        assert!(!state.set_stream_id("CA999"));
        assert_eq!(state.stream_id(), Some("CA123"));
    }

    #[test]
    fn test_media_clock_tracks_latest_frame() {
        let mut state = RelayState::new();
        for ts in [0, 20, 40, 400, 800] {
            state.record_media(ts);
            assert_eq!(state.latest_media_timestamp(), ts);
        }
    }

    #[test]
    fn test_audio_delta_emits_media_then_mark() {
        let mut state = RelayState::new();
        state.set_stream_id("CA123");
        state.record_media(120);

        let commands = state.record_audio_delta("r1", "item_1", "AAAA".to_string());

        assert_eq!(
            commands,
            vec![
                TelephonyCommand::media("CA123", "AAAA"),
                TelephonyCommand::response_part_mark("CA123"),
            ]
        );
        assert_eq!(state.pending_marks(), 1);
        assert_eq!(
            state.in_flight(),
            Some(&InFlightResponse {
                response_id: "r1".to_string(),
                item_id: "item_1".to_string(),
                started_at_ms: 120,
            })
        );
    }

    #[test]
    fn test_response_start_is_kept_across_chunks() {
        let mut state = RelayState::new();
        state.set_stream_id("CA123");
        state.record_media(100);
        state.record_audio_delta("r1", "item_1", "AA".to_string());
        state.record_media(300);
        state.record_audio_delta("r1", "item_1", "BB".to_string());

        let in_flight = state.in_flight().unwrap();
        assert_eq!(in_flight.started_at_ms, 100);
        assert_eq!(state.pending_marks(), 2);
    }

    #[test]
    fn test_audio_delta_without_stream_tracks_response_only() {
        let mut state = RelayState::new();
        let commands = state.record_audio_delta("r1", "item_1", "AA".to_string());

        assert!(commands.is_empty());
        assert_eq!(state.pending_marks(), 0);
        assert_eq!(state.in_flight().map(|r| r.response_id.as_str()), Some("r1"));
    }

    #[test]
    fn test_acknowledge_never_underflows() {
        let mut state = RelayState::new();
        assert!(!state.acknowledge());

        state.set_stream_id("CA123");
        state.record_audio_delta("r1", "item_1", "AA".to_string());
        state.record_audio_delta("r1", "item_1", "BB".to_string());

        assert!(state.acknowledge());
        assert!(state.acknowledge());
        assert!(!state.acknowledge());
        assert_eq!(state.pending_marks(), 0);
    }

    #[test]
    fn test_reset_response_clears_everything() {
        let mut state = RelayState::new();
        state.set_stream_id("CA123");
        state.record_audio_delta("r1", "item_1", "AA".to_string());

        let previous = state.reset_response();

        assert_eq!(previous.map(|r| r.item_id), Some("item_1".to_string()));
        assert!(state.in_flight().is_none());
        assert_eq!(state.pending_marks(), 0);
        assert_eq!(state.stream_id(), Some("CA123"));
    }
}
