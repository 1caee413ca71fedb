//! Environment variable loading.
//!
//! `.env` values are loaded into the process environment by `main` before this
//! runs, so real environment variables take precedence over them.

use std::error::Error;

use super::utils::{env_var, parse_env, parse_list};

/// Raw configuration values read from the environment. Unset values stay `None`
/// so YAML and defaults can fill them in later.
#[derive(Debug, Clone, Default)]
pub(super) struct EnvConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub public_host: Option<String>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,

    pub openai_api_key: Option<String>,

    pub realtime_url: Option<String>,
    pub realtime_model: Option<String>,
    pub realtime_voice: Option<String>,
    pub realtime_instructions: Option<String>,
    pub realtime_temperature: Option<f32>,
    pub realtime_audio_format: Option<String>,
    pub realtime_greeting: Option<String>,
    pub realtime_transcription_model: Option<String>,
    pub vad_threshold: Option<f32>,
    pub vad_prefix_padding_ms: Option<u32>,
    pub vad_silence_duration_ms: Option<u32>,

    pub goodbye_keywords: Option<Vec<String>>,
    pub farewell_payload: Option<String>,
    pub idle_timeout_seconds: Option<u64>,

    pub transcript_storage: Option<String>,
    pub transcript_bucket: Option<String>,
    pub transcript_prefix: Option<String>,
    pub transcript_local_path: Option<String>,
    pub transcript_s3_region: Option<String>,
    pub transcript_s3_endpoint: Option<String>,
    pub transcript_s3_access_key: Option<String>,
    pub transcript_s3_secret_key: Option<String>,
}

impl EnvConfig {
    /// Read every supported variable from the process environment.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            host: env_var("HOST"),
            port: parse_env("PORT")?,
            public_host: env_var("PUBLIC_HOST"),
            tls_cert_path: env_var("TLS_CERT_PATH"),
            tls_key_path: env_var("TLS_KEY_PATH"),

            openai_api_key: env_var("OPENAI_API_KEY"),

            realtime_url: env_var("REALTIME_URL"),
            realtime_model: env_var("REALTIME_MODEL"),
            realtime_voice: env_var("REALTIME_VOICE"),
            realtime_instructions: env_var("REALTIME_INSTRUCTIONS"),
            realtime_temperature: parse_env("REALTIME_TEMPERATURE")?,
            realtime_audio_format: env_var("REALTIME_AUDIO_FORMAT"),
            realtime_greeting: env_var("REALTIME_GREETING"),
            realtime_transcription_model: env_var("REALTIME_TRANSCRIPTION_MODEL"),
            vad_threshold: parse_env("VAD_THRESHOLD")?,
            vad_prefix_padding_ms: parse_env("VAD_PREFIX_PADDING_MS")?,
            vad_silence_duration_ms: parse_env("VAD_SILENCE_DURATION_MS")?,

            goodbye_keywords: env_var("GOODBYE_KEYWORDS").map(|raw| parse_list(&raw)),
            farewell_payload: env_var("FAREWELL_PAYLOAD"),
            idle_timeout_seconds: parse_env("CALL_IDLE_TIMEOUT_SECONDS")?,

            transcript_storage: env_var("TRANSCRIPT_STORAGE"),
            transcript_bucket: env_var("TRANSCRIPT_BUCKET").or_else(|| env_var("GCS_BUCKET_NAME")),
            transcript_prefix: env_var("TRANSCRIPT_PREFIX"),
            transcript_local_path: env_var("TRANSCRIPT_LOCAL_PATH"),
            transcript_s3_region: env_var("TRANSCRIPT_S3_REGION"),
            transcript_s3_endpoint: env_var("TRANSCRIPT_S3_ENDPOINT"),
            transcript_s3_access_key: env_var("TRANSCRIPT_S3_ACCESS_KEY"),
            transcript_s3_secret_key: env_var("TRANSCRIPT_S3_SECRET_KEY"),
        })
    }
}
