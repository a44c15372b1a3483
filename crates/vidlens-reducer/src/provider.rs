//! Video annotation provider abstraction.
//!
//! The reducer never talks to a cloud API directly. An `AnnotationProvider`
//! is injected into `VideoAnalyzer` and resolves uploaded bytes into a
//! `RawAnnotationResult`; transport, auth and job polling stay behind it.

use async_trait::async_trait;
use thiserror::Error;
use vidlens_models::RawAnnotationResult;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failure surfaced by a provider. Reported once, never retried here.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Video content is empty")]
    EmptyVideo,

    #[error("Invalid response from video analysis provider: {0}")]
    InvalidResponse(String),

    /// Deadline in milliseconds
    #[error("Video analysis timed out after {0}ms")]
    Timeout(u64),

    #[error("Video analysis failed: {0}")]
    Failed(String),
}

impl ProviderError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// An uploaded video held in memory.
#[derive(Debug, Clone, Default)]
pub struct VideoUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl VideoUpload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Submits a video and resolves to its annotation result.
#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Annotate the video, waiting for the provider's job to finish.
    async fn annotate(&self, video: &VideoUpload) -> ProviderResult<RawAnnotationResult>;

    /// Readiness check. Providers without a cheap check report ready.
    async fn check_ready(&self) -> ProviderResult<()> {
        Ok(())
    }
}
