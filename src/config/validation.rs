//! Configuration validation logic.

use crate::core::realtime::ServerVadConfig;

/// The realtime API key is the only mandatory setting.
pub(super) fn validate_openai_api_key(api_key: &Option<String>) -> Result<(), String> {
    match api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(
            "Missing OpenAI API key: set OPENAI_API_KEY or providers.openai_api_key".to_string(),
        ),
    }
}

/// TLS needs both a certificate and a key, or neither.
pub(super) fn validate_tls(cert_path: Option<&str>, key_path: Option<&str>) -> Result<(), String> {
    match (cert_path, key_path) {
        (Some(_), None) => Err("TLS certificate configured without TLS_KEY_PATH".to_string()),
        (None, Some(_)) => Err("TLS key configured without TLS_CERT_PATH".to_string()),
        _ => Ok(()),
    }
}

pub(super) fn validate_turn_detection(vad: &ServerVadConfig) -> Result<(), String> {
    if !(0.0..=1.0).contains(&vad.threshold) {
        return Err(format!(
            "VAD threshold must be between 0.0 and 1.0, got {}",
            vad.threshold
        ));
    }
    Ok(())
}

pub(super) fn validate_idle_timeout(seconds: Option<u64>) -> Result<(), String> {
    if seconds == Some(0) {
        return Err("Call idle timeout must be greater than zero seconds".to_string());
    }
    Ok(())
}

/// Check that the selected transcript backend has what it needs.
pub(super) fn validate_transcript_storage(
    storage: &str,
    bucket: Option<&str>,
    local_path: Option<&str>,
) -> Result<(), String> {
    match storage {
        "gcs" => Ok(()),
        "s3" if bucket.is_none() => {
            Err("TRANSCRIPT_STORAGE=s3 requires TRANSCRIPT_BUCKET".to_string())
        }
        "s3" => Ok(()),
        "local" if local_path.is_none() => {
            Err("TRANSCRIPT_STORAGE=local requires TRANSCRIPT_LOCAL_PATH".to_string())
        }
        "local" => Ok(()),
        other => Err(format!(
            "Unsupported transcript storage '{other}' (expected gcs, s3 or local)"
        )),
    }
}
