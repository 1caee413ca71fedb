//! Realtime AI side of a call.

pub mod base;
pub mod openai;

pub use base::{
    DEFAULT_GREETING_PROMPT, DEFAULT_INSTRUCTIONS, RealtimeError, RealtimeResult,
    RealtimeSettings, ServerVadConfig,
};
pub use openai::{ClientEvent, OpenAIRealtime, RealtimeLink, ServerEvent};
