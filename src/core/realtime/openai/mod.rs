//! OpenAI Realtime API provider.

pub mod client;
pub mod config;
pub mod messages;

pub use client::{OpenAIRealtime, RealtimeLink};
pub use config::{
    DEFAULT_REALTIME_MODEL, OPENAI_REALTIME_URL, OpenAIRealtimeAudioFormat, OpenAIRealtimeVoice,
};
pub use messages::{ClientEvent, ServerEvent, SessionConfig};
