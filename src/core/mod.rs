pub mod link;
pub mod realtime;
pub mod relay;
pub mod telephony;
pub mod transcript;

// Re-export commonly used types for convenience
pub use link::{Link, LinkError, LinkResult, LinkSender, channel_link};

pub use realtime::{OpenAIRealtime, RealtimeError, RealtimeResult, RealtimeSettings};

pub use relay::{
    AiEvent, CallSettings, CallSummary, RelayError, RelaySession, TelephonyEvent,
    TerminationReason,
};

pub use telephony::{TelephonyCommand, telephony_link};

pub use transcript::{
    GoodbyeDetector, Speaker, TranscriptAssembler, TranscriptLine, TranscriptSink,
    build_transcript_sink,
};
