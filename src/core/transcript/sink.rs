//! Transcript persistence for finished calls.
//!
//! Transcripts are written as plain text objects, one line per transcript entry,
//! to any `object_store` backend (Google Cloud Storage, S3 or a local directory).
//!
//! Object key format: `{prefix}/conversation-{YYYYmmdd-HHMMSS}-{call_id}.txt`

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::{ObjectStore, PutPayload, path::Path as ObjectPath};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use super::assembler::TranscriptLine;

/// Prefix used when none is configured.
pub const DEFAULT_TRANSCRIPT_PREFIX: &str = "recordings";

/// Errors raised while persisting a transcript.
#[derive(Debug, Error)]
pub enum TranscriptSinkError {
    #[error("Transcript storage misconfigured: {0}")]
    Configuration(String),

    #[error("Invalid transcript object path: {0}")]
    InvalidPath(String),

    #[error("Failed to write transcript: {0}")]
    Storage(#[from] object_store::Error),
}

/// Destination for finished call transcripts.
#[async_trait]
pub trait TranscriptSink: Send + Sync {
    /// Persist the transcript of one call.
    async fn persist(
        &self,
        call_id: &str,
        lines: &[TranscriptLine],
    ) -> Result<(), TranscriptSinkError>;
}

// =============================================================================
// Storage Configuration
// =============================================================================

/// Backend holding transcript objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptBackend {
    Gcs,
    S3 {
        region: Option<String>,
        endpoint: Option<String>,
        access_key: Option<String>,
        secret_key: Option<String>,
    },
    Local {
        root: PathBuf,
    },
}

impl TranscriptBackend {
    pub fn name(&self) -> &'static str {
        match self {
            TranscriptBackend::Gcs => "gcs",
            TranscriptBackend::S3 { .. } => "s3",
            TranscriptBackend::Local { .. } => "local",
        }
    }
}

/// Where transcripts go. A missing bucket (for cloud backends) disables persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptStorageConfig {
    pub backend: TranscriptBackend,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
}

impl Default for TranscriptStorageConfig {
    fn default() -> Self {
        Self {
            backend: TranscriptBackend::Gcs,
            bucket: None,
            prefix: Some(DEFAULT_TRANSCRIPT_PREFIX.to_string()),
        }
    }
}

impl TranscriptStorageConfig {
    pub fn is_enabled(&self) -> bool {
        match self.backend {
            TranscriptBackend::Local { .. } => true,
            _ => self.bucket.as_deref().is_some_and(|b| !b.trim().is_empty()),
        }
    }
}

/// Build the sink described by `config`.
///
/// Unconfigured storage yields a [`DisabledTranscriptSink`] rather than an error,
/// so calls still run when nobody wants their transcripts.
pub fn build_transcript_sink(
    config: &TranscriptStorageConfig,
) -> Result<Arc<dyn TranscriptSink>, TranscriptSinkError> {
    if !config.is_enabled() {
        return Ok(Arc::new(DisabledTranscriptSink));
    }

    let bucket = config.bucket.clone().unwrap_or_default();
    let store: Arc<dyn ObjectStore> = match &config.backend {
        TranscriptBackend::Gcs => Arc::new(
            GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(&bucket)
                .build()?,
        ),
        TranscriptBackend::S3 {
            region,
            endpoint,
            access_key,
            secret_key,
        } => {
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);
            if let Some(region) = region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = endpoint {
                builder = builder.with_endpoint(endpoint).with_allow_http(true);
            }
            if let (Some(access_key), Some(secret_key)) = (access_key, secret_key) {
                builder = builder
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key);
            }
            Arc::new(builder.build()?)
        }
        TranscriptBackend::Local { root } => {
            std::fs::create_dir_all(root).map_err(|e| {
                TranscriptSinkError::Configuration(format!(
                    "cannot create transcript directory {}: {e}",
                    root.display()
                ))
            })?;
            Arc::new(LocalFileSystem::new_with_prefix(root)?)
        }
    };

    let location = match &config.backend {
        TranscriptBackend::Local { root } => root.display().to_string(),
        backend => format!("{}://{}", backend.name(), bucket),
    };

    info!(location = %location, "Transcript storage enabled");
    Ok(Arc::new(ObjectStoreTranscriptSink::new(
        store,
        config.prefix.clone(),
        location,
    )))
}

// =============================================================================
// Sinks
// =============================================================================

/// Sink used when no storage is configured; it only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledTranscriptSink;

#[async_trait]
impl TranscriptSink for DisabledTranscriptSink {
    async fn persist(
        &self,
        call_id: &str,
        lines: &[TranscriptLine],
    ) -> Result<(), TranscriptSinkError> {
        warn!(
            call_id,
            lines = lines.len(),
            "Transcript storage not configured, skipping upload"
        );
        Ok(())
    }
}

/// Writes each transcript as one text object.
pub struct ObjectStoreTranscriptSink {
    store: Arc<dyn ObjectStore>,
    prefix: Option<String>,
    location: String,
}

impl ObjectStoreTranscriptSink {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: Option<String>, location: String) -> Self {
        Self {
            store,
            prefix,
            location,
        }
    }
}

#[async_trait]
impl TranscriptSink for ObjectStoreTranscriptSink {
    async fn persist(
        &self,
        call_id: &str,
        lines: &[TranscriptLine],
    ) -> Result<(), TranscriptSinkError> {
        if lines.is_empty() {
            warn!(call_id, "Transcript is empty, skipping upload");
            return Ok(());
        }

        let key = build_transcript_object_key(
            self.prefix.as_deref(),
            OffsetDateTime::now_utc(),
            call_id,
        );
        let path =
            ObjectPath::parse(&key).map_err(|e| TranscriptSinkError::InvalidPath(e.to_string()))?;

        self.store
            .put(&path, PutPayload::from(render_transcript(lines).into_bytes()))
            .await?;

        info!(
            call_id,
            lines = lines.len(),
            "Transcript uploaded to {}/{}",
            self.location,
            key
        );
        Ok(())
    }
}

/// Transcript body: rendered lines joined by newlines.
pub fn render_transcript(lines: &[TranscriptLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the object key for a transcript finished at `finished_at`.
pub fn build_transcript_object_key(
    prefix: Option<&str>,
    finished_at: OffsetDateTime,
    call_id: &str,
) -> String {
    let file_name = format!(
        "conversation-{:04}{:02}{:02}-{:02}{:02}{:02}-{}.txt",
        finished_at.year(),
        u8::from(finished_at.month()),
        finished_at.day(),
        finished_at.hour(),
        finished_at.minute(),
        finished_at.second(),
        call_id
    );

    match prefix
        .map(|p| p.trim().trim_matches('/'))
        .filter(|p| !p.is_empty())
    {
        Some(prefix) => format!("{prefix}/{file_name}"),
        None => file_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transcript::Speaker;
    use futures::TryStreamExt;
    use object_store::memory::InMemory;
    use tempfile::TempDir;

    // 2024-10-01 09:05:03 UTC
    fn finished_at() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_727_773_503).unwrap()
    }

    #[test]
    fn test_object_key_format() {
        assert_eq!(
            build_transcript_object_key(Some("recordings"), finished_at(), "call-1"),
            "recordings/conversation-20241001-090503-call-1.txt"
        );
        assert_eq!(
            build_transcript_object_key(Some(" /calls/prod/ "), finished_at(), "c"),
            "calls/prod/conversation-20241001-090503-c.txt"
        );
        assert_eq!(
            build_transcript_object_key(Some("  "), finished_at(), "c"),
            "conversation-20241001-090503-c.txt"
        );
        assert_eq!(
            build_transcript_object_key(None, finished_at(), "c"),
            "conversation-20241001-090503-c.txt"
        );
    }

    #[test]
    fn test_render_transcript_joins_lines() {
        let lines = vec![
            TranscriptLine::at(finished_at(), Speaker::Assistant, "Hello!"),
            TranscriptLine::at(finished_at(), Speaker::User, "Hi"),
        ];
        assert_eq!(
            render_transcript(&lines),
            "[09:05:03] ASSISTANT: Hello!\n[09:05:03] USER: Hi"
        );
    }

    #[test]
    fn test_storage_enabled_only_with_bucket() {
        let mut config = TranscriptStorageConfig::default();
        assert!(!config.is_enabled());

        config.bucket = Some("  ".to_string());
        assert!(!config.is_enabled());

        config.bucket = Some("call-transcripts".to_string());
        assert!(config.is_enabled());

        let local = TranscriptStorageConfig {
            backend: TranscriptBackend::Local {
                root: PathBuf::from("/tmp/transcripts"),
            },
            bucket: None,
            prefix: None,
        };
        assert!(local.is_enabled());
    }

    #[tokio::test]
    async fn test_object_store_sink_writes_transcript() {
        let store = Arc::new(InMemory::new());
        let sink = ObjectStoreTranscriptSink::new(
            store.clone(),
            Some("recordings".to_string()),
            "memory://test".to_string(),
        );
        let lines = vec![
            TranscriptLine::now(Speaker::Assistant, "Hello!"),
            TranscriptLine::now(Speaker::User, "Bye"),
        ];

        sink.persist("call-42", &lines).await.unwrap();

        let objects: Vec<_> = store.list(None).try_collect().await.unwrap();
        assert_eq!(objects.len(), 1);
        let key = objects[0].location.to_string();
        assert!(key.starts_with("recordings/conversation-"));
        assert!(key.ends_with("-call-42.txt"));

        let body = store
            .get(&objects[0].location)
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(body, render_transcript(&lines));
    }

    #[tokio::test]
    async fn test_object_store_sink_skips_empty_transcript() {
        let store = Arc::new(InMemory::new());
        let sink = ObjectStoreTranscriptSink::new(store.clone(), None, "memory://test".into());

        sink.persist("call-1", &[]).await.unwrap();

        let objects: Vec<_> = store.list(None).try_collect().await.unwrap();
        assert!(objects.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_sink_accepts_everything() {
        let sink = build_transcript_sink(&TranscriptStorageConfig::default()).unwrap();
        let lines = vec![TranscriptLine::now(Speaker::User, "hello")];
        assert!(sink.persist("call-1", &lines).await.is_ok());
    }

    #[tokio::test]
    async fn test_local_backend_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let config = TranscriptStorageConfig {
            backend: TranscriptBackend::Local {
                root: temp_dir.path().join("transcripts"),
            },
            bucket: None,
            prefix: Some("recordings".to_string()),
        };

        let sink = build_transcript_sink(&config).unwrap();
        sink.persist("call-7", &[TranscriptLine::now(Speaker::User, "hi")])
            .await
            .unwrap();

        let dir = temp_dir.path().join("transcripts").join("recordings");
        let entries: Vec<_> = std::fs::read_dir(dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
