use serde::Deserialize;
use std::path::PathBuf;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present here
/// override environment variables.
///
/// # Example YAML structure
/// ```yaml
/// server:
///   host: "0.0.0.0"
///   port: 5050
///   public_host: "relay.example.com"
///   tls:
///     enabled: true
///     cert_path: "/etc/relay/cert.pem"
///     key_path: "/etc/relay/key.pem"
///
/// providers:
///   openai_api_key: "sk-..."
///
/// realtime:
///   url: "wss://api.openai.com/v1/realtime"
///   model: "gpt-4o-realtime-preview-2024-10-01"
///   voice: "alloy"
///   instructions: "You are a helpful assistant."
///   temperature: 0.8
///   greeting: "Greet the user with 'Hello!'"
///   transcription_model: "whisper-1"
///   turn_detection:
///     threshold: 0.3
///     prefix_padding_ms: 300
///     silence_duration_ms: 400
///
/// call:
///   goodbye_keywords: ["bye", "goodbye", "take care"]
///   farewell_payload: "Goodbye, call me back if you need help."
///   idle_timeout_seconds: 300
///
/// transcripts:
///   storage: "s3"
///   bucket: "call-transcripts"
///   prefix: "recordings"
///   local_path: "/var/lib/relay/transcripts"
///   s3:
///     region: "us-east-1"
///     endpoint: "http://localhost:9000"
///     access_key: "access-key"
///     secret_key: "secret-key"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: Option<ServerYaml>,
    pub providers: Option<ProvidersYaml>,
    pub realtime: Option<RealtimeYaml>,
    pub call: Option<CallYaml>,
    pub transcripts: Option<TranscriptsYaml>,
}

/// Server configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Host advertised to the telephony provider in call setup instructions
    pub public_host: Option<String>,
    pub tls: Option<TlsYaml>,
}

/// TLS configuration from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TlsYaml {
    pub enabled: Option<bool>,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

/// Provider API keys from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProvidersYaml {
    /// OpenAI API key for the Realtime API
    pub openai_api_key: Option<String>,
}

/// Realtime session settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RealtimeYaml {
    pub url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub instructions: Option<String>,
    pub temperature: Option<f32>,
    pub audio_format: Option<String>,
    pub greeting: Option<String>,
    pub transcription_model: Option<String>,
    pub turn_detection: Option<TurnDetectionYaml>,
}

/// Server VAD thresholds from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TurnDetectionYaml {
    pub threshold: Option<f32>,
    pub prefix_padding_ms: Option<u32>,
    pub silence_duration_ms: Option<u32>,
}

/// Per-call behaviour from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CallYaml {
    pub goodbye_keywords: Option<Vec<String>>,
    pub farewell_payload: Option<String>,
    pub idle_timeout_seconds: Option<u64>,
}

/// Transcript storage from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TranscriptsYaml {
    /// One of `gcs`, `s3`, `local`
    pub storage: Option<String>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub local_path: Option<String>,
    pub s3: Option<S3Yaml>,
}

/// S3 connection details from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct S3Yaml {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl YamlConfig {
    /// Load YAML configuration from a file
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be read
    /// - The YAML is malformed
    /// - Fields have invalid types
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;

        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse YAML config: {e}"))?;

        Ok(config)
    }
}
