//! Control events consumed by the relay, one enum per link direction.

use crate::core::transcript::Speaker;

/// Event received from the telephony side of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelephonyEvent {
    /// The media stream started; carries the stream identity.
    CallStarted {
        stream_id: String,
        call_id: Option<String>,
    },
    /// One inbound audio frame.
    MediaReceived { timestamp_ms: u64, payload: String },
    /// Echo of a mark token sent earlier.
    AckReceived,
    /// The caller hung up.
    CallStopped,
}

impl TelephonyEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TelephonyEvent::CallStarted { .. } => "call_started",
            TelephonyEvent::MediaReceived { .. } => "media_received",
            TelephonyEvent::AckReceived => "ack_received",
            TelephonyEvent::CallStopped => "call_stopped",
        }
    }
}

/// Event received from the AI side of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum AiEvent {
    SessionCreated {
        session_id: String,
    },
    /// A chunk of synthesized audio for an assistant response.
    AudioDelta {
        response_id: String,
        item_id: String,
        payload: String,
    },
    /// The caller started speaking.
    SpeechStarted,
    SpeechStopped,
    /// The caller's speech segment was accepted by the session.
    BufferCommitted,
    ResponseCompleted(CompletedResponse),
    /// One piece of caller text delivered incrementally.
    InputTextFragment(String),
    /// Full transcription of one caller utterance.
    InputTranscriptCompleted(String),
    RateLimitsUpdated,
    Error {
        message: String,
    },
}

impl AiEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AiEvent::SessionCreated { .. } => "session_created",
            AiEvent::AudioDelta { .. } => "audio_delta",
            AiEvent::SpeechStarted => "speech_started",
            AiEvent::SpeechStopped => "speech_stopped",
            AiEvent::BufferCommitted => "buffer_committed",
            AiEvent::ResponseCompleted(_) => "response_completed",
            AiEvent::InputTextFragment(_) => "input_text_fragment",
            AiEvent::InputTranscriptCompleted(_) => "input_transcript_completed",
            AiEvent::RateLimitsUpdated => "rate_limits_updated",
            AiEvent::Error { .. } => "error",
        }
    }
}

/// A finished assistant response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletedResponse {
    pub response_id: Option<String>,
    pub outputs: Vec<ResponseOutput>,
    /// Caller utterance the session inferred for this turn
    pub input_transcript: Option<String>,
}

/// One output item of a response with the text that was spoken for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutput {
    pub speaker: Speaker,
    pub spoken: Vec<String>,
}

impl ResponseOutput {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            spoken: vec![text.into()],
        }
    }
}
