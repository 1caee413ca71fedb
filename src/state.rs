//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::transcript::{TranscriptSink, TranscriptSinkError, build_transcript_sink};

/// State shared by every request and call.
pub struct AppState {
    pub config: ServerConfig,
    /// Where finished call transcripts are handed off
    pub transcript_sink: Arc<dyn TranscriptSink>,
}

impl AppState {
    /// Build the state, creating the transcript sink from configuration.
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, TranscriptSinkError> {
        let transcript_sink = build_transcript_sink(&config.transcripts)?;
        Ok(Self::with_sink(config, transcript_sink))
    }

    pub fn with_sink(config: ServerConfig, transcript_sink: Arc<dyn TranscriptSink>) -> Arc<Self> {
        Arc::new(Self {
            config,
            transcript_sink,
        })
    }
}
