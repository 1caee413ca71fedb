//! Server configuration fixtures

use std::path::Path;

use waav_call_relay::ServerConfig;
use waav_call_relay::core::realtime::RealtimeSettings;
use waav_call_relay::core::relay::CallSettings;
use waav_call_relay::core::transcript::{TranscriptBackend, TranscriptStorageConfig};

pub const TEST_API_KEY: &str = "sk-test-relay";

/// Minimal configuration: no public host, no TLS, transcripts disabled.
pub fn create_minimal_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_host: None,
        tls: None,
        openai_api_key: Some(TEST_API_KEY.to_string()),
        realtime: RealtimeSettings::default(),
        call: CallSettings::default(),
        transcripts: TranscriptStorageConfig::default(),
    }
}

/// Configuration pointing the realtime client at `realtime_url` and writing
/// transcripts below `transcript_root`.
pub fn create_relay_config(realtime_url: &str, transcript_root: &Path) -> ServerConfig {
    let mut config = create_minimal_config();
    config.realtime = RealtimeSettings {
        url: realtime_url.to_string(),
        ..RealtimeSettings::default()
    };
    config.transcripts = TranscriptStorageConfig {
        backend: TranscriptBackend::Local {
            root: transcript_root.to_path_buf(),
        },
        bucket: None,
        prefix: Some("recordings".to_string()),
    };
    config
}
