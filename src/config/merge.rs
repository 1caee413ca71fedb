//! Merging YAML and environment configurations.
//!
//! Priority: YAML > environment variables > defaults.

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use super::env::EnvConfig;
use super::utils::normalize_keywords;
use super::validation;
use super::yaml::{
    CallYaml, ProvidersYaml, RealtimeYaml, S3Yaml, ServerYaml, TlsYaml, TranscriptsYaml,
    TurnDetectionYaml, YamlConfig,
};
use super::{ServerConfig, TlsConfig};
use crate::core::realtime::{RealtimeSettings, ServerVadConfig};
use crate::core::relay::CallSettings;
use crate::core::transcript::{
    DEFAULT_TRANSCRIPT_PREFIX, TranscriptBackend, TranscriptStorageConfig,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5050;

/// Build the server configuration from the environment with optional YAML overrides.
pub(super) fn merge_config(yaml: Option<YamlConfig>) -> Result<ServerConfig, Box<dyn Error>> {
    let env = EnvConfig::from_env()?;
    let yaml = yaml.unwrap_or_default();

    let server = yaml.server.unwrap_or_default();
    let providers = yaml.providers.unwrap_or_default();

    Ok(ServerConfig {
        host: server
            .host
            .clone()
            .or(env.host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: server.port.or(env.port).unwrap_or(DEFAULT_PORT),
        public_host: server.public_host.clone().or(env.public_host.clone()),
        tls: merge_tls(&server, &env)?,
        openai_api_key: merge_api_key(providers, &env),
        realtime: merge_realtime(yaml.realtime.unwrap_or_default(), &env),
        call: merge_call(yaml.call.unwrap_or_default(), &env)?,
        transcripts: merge_transcripts(yaml.transcripts.unwrap_or_default(), &env)?,
    })
}

fn merge_tls(server: &ServerYaml, env: &EnvConfig) -> Result<Option<TlsConfig>, String> {
    let tls = server.tls.clone().unwrap_or_default();
    let TlsYaml {
        enabled,
        cert_path,
        key_path,
    } = tls;

    if enabled == Some(false) {
        return Ok(None);
    }

    let cert_path = cert_path.or(env.tls_cert_path.clone());
    let key_path = key_path.or(env.tls_key_path.clone());
    validation::validate_tls(cert_path.as_deref(), key_path.as_deref())?;

    Ok(match (cert_path, key_path) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path: PathBuf::from(cert_path),
            key_path: PathBuf::from(key_path),
        }),
        _ => None,
    })
}

fn merge_api_key(providers: ProvidersYaml, env: &EnvConfig) -> Option<String> {
    providers.openai_api_key.or(env.openai_api_key.clone())
}

fn merge_realtime(realtime: RealtimeYaml, env: &EnvConfig) -> RealtimeSettings {
    let defaults = RealtimeSettings::default();
    let vad = realtime.turn_detection.unwrap_or_default();
    let TurnDetectionYaml {
        threshold,
        prefix_padding_ms,
        silence_duration_ms,
    } = vad;
    let vad_defaults = ServerVadConfig::default();

    RealtimeSettings {
        url: realtime
            .url
            .or(env.realtime_url.clone())
            .unwrap_or(defaults.url),
        model: realtime
            .model
            .or(env.realtime_model.clone())
            .unwrap_or(defaults.model),
        voice: realtime
            .voice
            .or(env.realtime_voice.clone())
            .unwrap_or(defaults.voice),
        instructions: realtime
            .instructions
            .or(env.realtime_instructions.clone())
            .unwrap_or(defaults.instructions),
        temperature: realtime
            .temperature
            .or(env.realtime_temperature)
            .unwrap_or(defaults.temperature),
        audio_format: realtime
            .audio_format
            .or(env.realtime_audio_format.clone())
            .unwrap_or(defaults.audio_format),
        turn_detection: ServerVadConfig {
            threshold: threshold
                .or(env.vad_threshold)
                .unwrap_or(vad_defaults.threshold),
            prefix_padding_ms: prefix_padding_ms.or(env.vad_prefix_padding_ms),
            silence_duration_ms: silence_duration_ms
                .or(env.vad_silence_duration_ms)
                .unwrap_or(vad_defaults.silence_duration_ms),
        },
        greeting_prompt: realtime
            .greeting
            .or(env.realtime_greeting.clone())
            .unwrap_or(defaults.greeting_prompt),
        transcription_model: realtime
            .transcription_model
            .or(env.realtime_transcription_model.clone()),
    }
}

fn merge_call(call: CallYaml, env: &EnvConfig) -> Result<CallSettings, String> {
    let defaults = CallSettings::default();

    let idle_timeout_seconds = call.idle_timeout_seconds.or(env.idle_timeout_seconds);
    validation::validate_idle_timeout(idle_timeout_seconds)?;

    Ok(CallSettings {
        goodbye_keywords: call
            .goodbye_keywords
            .or(env.goodbye_keywords.clone())
            .map(normalize_keywords)
            .unwrap_or(defaults.goodbye_keywords),
        farewell_payload: call
            .farewell_payload
            .or(env.farewell_payload.clone())
            .unwrap_or(defaults.farewell_payload),
        idle_timeout: idle_timeout_seconds.map(Duration::from_secs),
    })
}

fn merge_transcripts(
    transcripts: TranscriptsYaml,
    env: &EnvConfig,
) -> Result<TranscriptStorageConfig, String> {
    let storage = transcripts
        .storage
        .or(env.transcript_storage.clone())
        .unwrap_or_else(|| "gcs".to_string())
        .to_lowercase();
    let bucket = transcripts.bucket.or(env.transcript_bucket.clone());
    let local_path = transcripts
        .local_path
        .or(env.transcript_local_path.clone());
    let prefix = transcripts
        .prefix
        .or(env.transcript_prefix.clone())
        .unwrap_or_else(|| DEFAULT_TRANSCRIPT_PREFIX.to_string());

    validation::validate_transcript_storage(&storage, bucket.as_deref(), local_path.as_deref())?;

    let backend = match (storage.as_str(), local_path) {
        ("s3", _) => {
            let S3Yaml {
                region,
                endpoint,
                access_key,
                secret_key,
            } = transcripts.s3.unwrap_or_default();
            TranscriptBackend::S3 {
                region: region.or(env.transcript_s3_region.clone()),
                endpoint: endpoint.or(env.transcript_s3_endpoint.clone()),
                access_key: access_key.or(env.transcript_s3_access_key.clone()),
                secret_key: secret_key.or(env.transcript_s3_secret_key.clone()),
            }
        }
        ("local", Some(root)) => TranscriptBackend::Local {
            root: PathBuf::from(root),
        },
        _ => TranscriptBackend::Gcs,
    };

    Ok(TranscriptStorageConfig {
        backend,
        bucket,
        prefix: Some(prefix),
    })
}
