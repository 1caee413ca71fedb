//! Media stream wire messages exchanged with the telephony provider.
//!
//! Every frame is a JSON text message tagged by its `event` field.
//!
//! Inbound (provider to relay):
//! - `connected` - socket accepted by the provider
//! - `start` - stream metadata, carries the `streamSid`
//! - `media` - one audio chunk with its millisecond timestamp
//! - `mark` - echo of a mark previously sent by the relay
//! - `stop` - the call ended
//!
//! Outbound (relay to provider): `media`, `mark`, `clear` and `stop`, each
//! addressed by `streamSid`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::relay::TelephonyEvent;

/// Name of the mark token the relay sends after each outbound audio chunk.
pub const RESPONSE_PART_MARK: &str = "responsePart";

// =============================================================================
// Inbound Messages
// =============================================================================

/// Message received from the telephony provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyInbound {
    Connected {
        #[serde(default)]
        protocol: Option<String>,
        #[serde(default)]
        version: Option<String>,
    },

    Start {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
        start: StartMetadata,
    },

    Media {
        media: InboundMedia,
    },

    Mark {
        #[serde(default)]
        mark: Option<MarkLabel>,
    },

    Stop {
        #[serde(rename = "streamSid", default)]
        stream_sid: Option<String>,
    },

    /// Any other event kind (dtmf and friends); ignored by the relay.
    #[serde(other)]
    Unknown,
}

/// Metadata carried by the `start` message.
#[derive(Debug, Clone, Deserialize)]
pub struct StartMetadata {
    #[serde(rename = "streamSid", default)]
    pub stream_sid: Option<String>,
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(rename = "accountSid", default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(rename = "mediaFormat", default)]
    pub media_format: Option<MediaFormat>,
}

/// Audio encoding announced in the `start` message. Informational only, so
/// missing fields fall back to zero values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaFormat {
    #[serde(default)]
    pub encoding: String,
    #[serde(rename = "sampleRate", default)]
    pub sample_rate: u32,
    #[serde(default)]
    pub channels: u16,
}

/// Audio chunk carried by an inbound `media` message.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMedia {
    /// Milliseconds since the start of the stream. Providers send it as a string.
    #[serde(deserialize_with = "deserialize_millis")]
    pub timestamp: u64,
    /// Base64 encoded audio.
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
}

/// Named mark token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkLabel {
    pub name: String,
}

fn deserialize_millis<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(u64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Number(value) => Ok(value),
        Millis::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

impl TelephonyInbound {
    /// Parse one text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Wire name of the event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            TelephonyInbound::Connected { .. } => "connected",
            TelephonyInbound::Start { .. } => "start",
            TelephonyInbound::Media { .. } => "media",
            TelephonyInbound::Mark { .. } => "mark",
            TelephonyInbound::Stop { .. } => "stop",
            TelephonyInbound::Unknown => "unknown",
        }
    }

    /// Map to the control event the relay consumes.
    ///
    /// Returns `None` for messages the relay has no use for.
    pub fn into_event(self) -> Option<TelephonyEvent> {
        match self {
            TelephonyInbound::Start { stream_sid, start } => {
                let stream_id = start.stream_sid.or(stream_sid)?;
                Some(TelephonyEvent::CallStarted {
                    stream_id,
                    call_id: start.call_sid,
                })
            }
            TelephonyInbound::Media { media } => Some(TelephonyEvent::MediaReceived {
                timestamp_ms: media.timestamp,
                payload: media.payload,
            }),
            TelephonyInbound::Mark { .. } => Some(TelephonyEvent::AckReceived),
            TelephonyInbound::Stop { .. } => Some(TelephonyEvent::CallStopped),
            TelephonyInbound::Connected { .. } | TelephonyInbound::Unknown => None,
        }
    }
}

// =============================================================================
// Outbound Messages
// =============================================================================

/// Message sent to the telephony provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyCommand {
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkLabel,
    },

    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },

    Stop {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Audio chunk carried by an outbound `media` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

impl TelephonyCommand {
    pub fn media(stream_sid: impl Into<String>, payload: impl Into<String>) -> Self {
        TelephonyCommand::Media {
            stream_sid: stream_sid.into(),
            media: OutboundMedia {
                payload: payload.into(),
            },
        }
    }

    /// Mark token requesting an acknowledgment of the audio sent so far.
    pub fn response_part_mark(stream_sid: impl Into<String>) -> Self {
        TelephonyCommand::Mark {
            stream_sid: stream_sid.into(),
            mark: MarkLabel {
                name: RESPONSE_PART_MARK.to_string(),
            },
        }
    }

    pub fn clear(stream_sid: impl Into<String>) -> Self {
        TelephonyCommand::Clear {
            stream_sid: stream_sid.into(),
        }
    }

    pub fn stop(stream_sid: impl Into<String>) -> Self {
        TelephonyCommand::Stop {
            stream_sid: stream_sid.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TelephonyCommand::Media { .. } => "media",
            TelephonyCommand::Mark { .. } => "mark",
            TelephonyCommand::Clear { .. } => "clear",
            TelephonyCommand::Stop { .. } => "stop",
        }
    }

    pub fn stream_sid(&self) -> &str {
        match self {
            TelephonyCommand::Media { stream_sid, .. }
            | TelephonyCommand::Mark { stream_sid, .. }
            | TelephonyCommand::Clear { stream_sid }
            | TelephonyCommand::Stop { stream_sid } => stream_sid,
        }
    }
}
