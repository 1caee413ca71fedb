//! Call transcripts: assembly during the call and persistence after it.

pub mod assembler;
pub mod sink;

pub use assembler::{
    DEFAULT_GOODBYE_KEYWORDS, GoodbyeDetector, ResponseOutcome, SPEECH_COMMITTED_MARKER, Speaker,
    TranscriptAssembler, TranscriptLine,
};
pub use sink::{
    DEFAULT_TRANSCRIPT_PREFIX, DisabledTranscriptSink, ObjectStoreTranscriptSink,
    TranscriptBackend, TranscriptSink, TranscriptSinkError, TranscriptStorageConfig,
    build_transcript_object_key, build_transcript_sink, render_transcript,
};
