//! OpenAI Realtime API WebSocket message types.
//!
//! Only the events a call relay exchanges are modelled. Unknown server events
//! deserialize to [`ServerEvent::Unknown`] so new event kinds never break a call.
//!
//! Client events (sent to server):
//! - session.update
//! - input_audio_buffer.append
//! - conversation.item.create
//! - conversation.item.truncate
//! - response.create
//!
//! Server events (received from server):
//! - error
//! - session.created / session.updated
//! - input_audio_buffer.speech_started / speech_stopped / committed
//! - conversation.item.input_audio_transcription.completed
//! - input.audio.text
//! - response.audio.delta
//! - response.done
//! - rate_limits.updated

use base64::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::relay::{AiEvent, CompletedResponse, ResponseOutput};
use crate::core::transcript::Speaker;

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration sent with `session.update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modalities: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<InputAudioTranscription>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Input audio transcription configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputAudioTranscription {
    /// Transcription model (e.g., "whisper-1")
    pub model: String,
}

/// Turn detection configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TurnDetection {
    #[serde(rename = "server_vad")]
    ServerVad {
        #[serde(skip_serializing_if = "Option::is_none")]
        threshold: Option<f32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        prefix_padding_ms: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        silence_duration_ms: Option<u32>,
    },
}

// =============================================================================
// Conversation Items
// =============================================================================

/// Conversation item, as created by the client or returned in a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item type (message, function_call, ...)
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Item role (user, assistant, system)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentPart>>,
}

impl ConversationItem {
    /// A user message holding a single text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            item_type: "message".to_string(),
            status: None,
            role: Some("user".to_string()),
            content: Some(vec![ContentPart {
                content_type: "input_text".to_string(),
                text: Some(text.into()),
                audio: None,
                transcript: None,
            }]),
        }
    }
}

/// Content part within a conversation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    /// Content type (input_text, input_audio, text, audio)
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Audio content (base64 encoded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    /// Transcript of audio content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ContentPart {
    /// Transcript of a spoken audio part, if the part carries one.
    pub fn spoken_transcript(&self) -> Option<&str> {
        if self.content_type != "audio" {
            return None;
        }
        self.transcript.as_deref().filter(|t| !t.is_empty())
    }
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Append caller audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio, relayed exactly as received
        audio: String,
    },

    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        item: ConversationItem,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_item_id: Option<String>,
    },

    /// Drop the part of an assistant item the caller never heard
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u32,
    },

    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Truncate the first content part of `item_id` after `elapsed_ms`.
    pub fn truncate(item_id: impl Into<String>, elapsed_ms: u64) -> Self {
        ClientEvent::ConversationItemTruncate {
            item_id: item_id.into(),
            content_index: 0,
            audio_end_ms: u32::try_from(elapsed_ms).unwrap_or(u32::MAX),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClientEvent::SessionUpdate { .. } => "session.update",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::ConversationItemTruncate { .. } => "conversation.item.truncate",
            ClientEvent::ResponseCreate => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "error")]
    Error { error: ApiError },

    #[serde(rename = "session.created")]
    SessionCreated { session: Session },

    #[serde(rename = "session.updated")]
    SessionUpdated { session: Session },

    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {
        #[serde(default)]
        audio_start_ms: u64,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {
        #[serde(default)]
        audio_end_ms: u64,
        #[serde(default)]
        item_id: Option<String>,
    },

    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted {
        #[serde(default)]
        item_id: Option<String>,
    },

    /// Caller speech transcribed by the session's transcription model
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    TranscriptionCompleted {
        #[serde(default)]
        item_id: Option<String>,
        transcript: String,
    },

    /// Caller speech delivered fragment by fragment
    #[serde(rename = "input.audio.text")]
    InputAudioText {
        #[serde(default)]
        text: Option<String>,
    },

    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        response_id: String,
        item_id: String,
        #[serde(default)]
        output_index: u32,
        #[serde(default)]
        content_index: u32,
        /// Base64-encoded audio delta
        delta: String,
    },

    #[serde(rename = "response.done")]
    ResponseDone {
        response: Response,
        /// Caller utterance inferred for this turn, when the server reports one
        #[serde(default)]
        input: Option<InputSummary>,
    },

    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated {
        #[serde(default)]
        rate_limits: Vec<RateLimit>,
    },

    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Parse one text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Error { .. } => "error",
            ServerEvent::SessionCreated { .. } => "session.created",
            ServerEvent::SessionUpdated { .. } => "session.updated",
            ServerEvent::SpeechStarted { .. } => "input_audio_buffer.speech_started",
            ServerEvent::SpeechStopped { .. } => "input_audio_buffer.speech_stopped",
            ServerEvent::InputAudioBufferCommitted { .. } => "input_audio_buffer.committed",
            ServerEvent::TranscriptionCompleted { .. } => {
                "conversation.item.input_audio_transcription.completed"
            }
            ServerEvent::InputAudioText { .. } => "input.audio.text",
            ServerEvent::AudioDelta { .. } => "response.audio.delta",
            ServerEvent::ResponseDone { .. } => "response.done",
            ServerEvent::RateLimitsUpdated { .. } => "rate_limits.updated",
            ServerEvent::Unknown => "unknown",
        }
    }

    /// Whether the event kind is worth an operator-facing log line.
    pub fn is_logged(&self) -> bool {
        matches!(
            self,
            ServerEvent::Error { .. }
                | ServerEvent::SessionCreated { .. }
                | ServerEvent::SpeechStarted { .. }
                | ServerEvent::SpeechStopped { .. }
                | ServerEvent::InputAudioBufferCommitted { .. }
                | ServerEvent::ResponseDone { .. }
                | ServerEvent::RateLimitsUpdated { .. }
        )
    }

    /// Map to the control event the relay consumes.
    ///
    /// `Ok(None)` means the event carries nothing the relay acts on. An audio
    /// delta whose payload is not valid base64 is rejected as malformed.
    pub fn into_event(self) -> Result<Option<AiEvent>, String> {
        let event = match self {
            ServerEvent::Error { error } => AiEvent::Error {
                message: format!("{}: {}", error.error_type, error.message),
            },
            ServerEvent::SessionCreated { session } => AiEvent::SessionCreated {
                session_id: session.id,
            },
            ServerEvent::SpeechStarted { .. } => AiEvent::SpeechStarted,
            ServerEvent::SpeechStopped { .. } => AiEvent::SpeechStopped,
            ServerEvent::InputAudioBufferCommitted { .. } => AiEvent::BufferCommitted,
            ServerEvent::TranscriptionCompleted { transcript, .. } => {
                AiEvent::InputTranscriptCompleted(transcript)
            }
            ServerEvent::InputAudioText { text } => match text {
                Some(text) => AiEvent::InputTextFragment(text),
                None => return Ok(None),
            },
            ServerEvent::AudioDelta {
                response_id,
                item_id,
                delta,
                ..
            } => {
                let audio = BASE64_STANDARD
                    .decode(delta.as_bytes())
                    .map_err(|e| format!("invalid audio delta payload: {e}"))?;
                AiEvent::AudioDelta {
                    response_id,
                    item_id,
                    payload: BASE64_STANDARD.encode(audio),
                }
            }
            ServerEvent::ResponseDone { response, input } => {
                AiEvent::ResponseCompleted(response.into_completed(input))
            }
            ServerEvent::RateLimitsUpdated { .. } => AiEvent::RateLimitsUpdated,
            ServerEvent::SessionUpdated { .. } | ServerEvent::Unknown => return Ok(None),
        };

        Ok(Some(event))
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    #[serde(rename = "type", default)]
    pub error_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Session information.
#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub voice: Option<String>,
}

/// Response information carried by `response.done`.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<ConversationItem>,
}

impl Response {
    fn into_completed(self, input: Option<InputSummary>) -> CompletedResponse {
        let outputs = self
            .output
            .iter()
            .map(|item| ResponseOutput {
                speaker: Speaker::from_role(item.role.as_deref()),
                spoken: item
                    .content
                    .iter()
                    .flatten()
                    .filter_map(ContentPart::spoken_transcript)
                    .map(str::to_string)
                    .collect(),
            })
            .collect();

        CompletedResponse {
            response_id: self.id,
            outputs,
            input_transcript: input
                .and_then(|i| i.transcript)
                .filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Caller input reported alongside a completed response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InputSummary {
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Rate limit information.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimit {
    pub name: String,
    pub limit: u32,
    pub remaining: u32,
    pub reset_seconds: f64,
}

// =============================================================================
// Tests
// =============================================================================
