//! Shared types for the realtime AI side of a call.
//!
//! [`RealtimeSettings`] carries the fixed session configuration sent during the
//! handshake. It is filled in by the server configuration and consumed by the
//! provider client when a call connects.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::openai::config::{DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL};

/// System prompt used when none is configured.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful and bubbly AI assistant who answers any questions I ask. \
     Your answers should be brief, to the point, and avoid repeating what the user has already said.";

/// Opening turn injected right after the session is configured.
pub const DEFAULT_GREETING_PROMPT: &str = "Greet the user with 'Hello!, how are you doing today?'";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while talking to the realtime provider.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for realtime operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

// =============================================================================
// Session Settings
// =============================================================================

/// Server-side voice activity detection thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVadConfig {
    /// Activation threshold (0.0 to 1.0)
    pub threshold: f32,
    /// Audio kept before detected speech, in ms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_padding_ms: Option<u32>,
    /// Silence that ends a turn, in ms
    pub silence_duration_ms: u32,
}

impl Default for ServerVadConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            prefix_padding_ms: None,
            silence_duration_ms: 400,
        }
    }
}

/// Fixed configuration of the AI session a call talks to.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSettings {
    /// WebSocket endpoint, without the model query parameter
    pub url: String,
    pub model: String,
    pub voice: String,
    pub instructions: String,
    pub temperature: f32,
    /// Audio encoding used in both directions
    pub audio_format: String,
    pub turn_detection: ServerVadConfig,
    /// Text of the scripted opening turn
    pub greeting_prompt: String,
    /// Enables input audio transcription with this model
    pub transcription_model: Option<String>,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            url: OPENAI_REALTIME_URL.to_string(),
            model: DEFAULT_REALTIME_MODEL.to_string(),
            voice: "alloy".to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            temperature: 0.8,
            audio_format: "g711_ulaw".to_string(),
            turn_detection: ServerVadConfig::default(),
            greeting_prompt: DEFAULT_GREETING_PROMPT.to_string(),
            transcription_model: None,
        }
    }
}

impl RealtimeSettings {
    /// Endpoint URL including the model query parameter.
    pub fn endpoint(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}model={}", self.url, separator, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RealtimeSettings::default();
        assert_eq!(settings.voice, "alloy");
        assert_eq!(settings.audio_format, "g711_ulaw");
        assert_eq!(settings.temperature, 0.8);
        assert_eq!(settings.turn_detection.threshold, 0.3);
        assert_eq!(settings.turn_detection.silence_duration_ms, 400);
        assert!(settings.transcription_model.is_none());
    }

    #[test]
    fn test_endpoint_appends_model() {
        let settings = RealtimeSettings::default();
        assert_eq!(
            settings.endpoint(),
            "wss://api.openai.com/v1/realtime?model=gpt-4o-realtime-preview-2024-10-01"
        );

        let custom = RealtimeSettings {
            url: "ws://127.0.0.1:9000/v1/realtime?debug=1".to_string(),
            model: "test-model".to_string(),
            ..Default::default()
        };
        assert_eq!(
            custom.endpoint(),
            "ws://127.0.0.1:9000/v1/realtime?debug=1&model=test-model"
        );
    }

    #[test]
    fn test_error_display() {
        let err = RealtimeError::ConnectionFailed("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }
}
