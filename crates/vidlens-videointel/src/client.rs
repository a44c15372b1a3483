//! Video Intelligence REST API client.
//!
//! - Token caching with refresh margin
//! - HTTP client tuning (pooling, timeouts)
//! - Exponential backoff with jitter
//! - Long-running operation polling bounded by a deadline
//! - Observability (tracing spans, metrics)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, info_span, warn, Instrument};
use vidlens_models::{RawAnnotationResult, VideoSegment};
use vidlens_reducer::{AnnotationProvider, ProviderError, ProviderResult, VideoUpload};

use crate::error::{VideoIntelError, VideoIntelResult};
use crate::metrics::{record_operation_duration, record_request};
use crate::retry::{with_retry, Replay, RetryConfig};
use crate::token_cache::{AccessTokenSource, TokenCache};
use crate::types::{
    AnnotateVideoRequest, Feature, Operation, SpeechTranscriptionConfig, VideoContext,
};

/// Public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://videointelligence.googleapis.com";

/// Credentials file picked up from the working directory when present.
const LOCAL_CREDENTIALS_FILE: &str = "./credentials.json";

// =============================================================================
// Configuration
// =============================================================================

/// Video Intelligence client configuration.
#[derive(Debug, Clone)]
pub struct VideoIntelConfig {
    /// API base URL (overridable for emulators and tests)
    pub base_url: String,
    /// GCP project ID, informational only
    pub project_id: Option<String>,
    /// Service account key file. Falls back to GOOGLE_APPLICATION_CREDENTIALS.
    pub credentials_path: Option<PathBuf>,
    /// Features to request
    pub features: Vec<Feature>,
    /// Only the first N seconds of the video are analyzed
    pub max_segment_secs: i64,
    /// Language for speech transcription
    pub language_code: String,
    /// Delay between operation polls
    pub poll_interval: Duration,
    /// Give up on an operation after this long
    pub operation_timeout: Duration,
    /// Per-request timeout (uploads carry the whole video)
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl Default for VideoIntelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: None,
            credentials_path: None,
            features: Feature::DEFAULTS.to_vec(),
            max_segment_secs: 60,
            language_code: "en-US".to_string(),
            poll_interval: Duration::from_millis(5000),
            operation_timeout: Duration::from_secs(600),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(5),
            retry: RetryConfig::default(),
        }
    }
}

impl VideoIntelConfig {
    /// Create config from environment variables.
    pub fn from_env() -> VideoIntelResult<Self> {
        let defaults = Self::default();

        let features = match std::env::var("VIDEOINTEL_FEATURES") {
            Ok(list) if !list.trim().is_empty() => list
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Feature>, _>>()
                .map_err(|e| VideoIntelError::request_failed(format!("VIDEOINTEL_FEATURES: {}", e)))?,
            _ => defaults.features,
        };

        let credentials_path = std::env::var("VIDEOINTEL_CREDENTIALS")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(LOCAL_CREDENTIALS_FILE);
                local.exists().then_some(local)
            });

        Ok(Self {
            base_url: std::env::var("VIDEOINTEL_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            project_id: std::env::var("GCP_PROJECT_ID").ok().filter(|s| !s.is_empty()),
            credentials_path,
            features,
            max_segment_secs: env_parse("VIDEOINTEL_MAX_SEGMENT_SECS", defaults.max_segment_secs),
            language_code: std::env::var("VIDEOINTEL_LANGUAGE_CODE")
                .unwrap_or(defaults.language_code),
            poll_interval: Duration::from_millis(env_parse("VIDEOINTEL_POLL_INTERVAL_MS", 5000)),
            operation_timeout: Duration::from_secs(env_parse(
                "VIDEOINTEL_OPERATION_TIMEOUT_SECS",
                600,
            )),
            timeout: Duration::from_secs(env_parse("VIDEOINTEL_REQUEST_TIMEOUT_SECS", 120)),
            connect_timeout: Duration::from_secs(env_parse("VIDEOINTEL_CONNECT_TIMEOUT_SECS", 5)),
            retry: RetryConfig::from_env(),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// Client
// =============================================================================

/// Video Intelligence REST API client.
#[derive(Clone)]
pub struct VideoIntelClient {
    http: Client,
    config: VideoIntelConfig,
    tokens: Arc<dyn AccessTokenSource>,
}

impl VideoIntelClient {
    /// Create a client authenticated with a service account.
    pub fn new(config: VideoIntelConfig) -> VideoIntelResult<Self> {
        let auth = Self::create_auth_provider(&config)?;
        Self::with_token_source(config, Arc::new(TokenCache::new(auth)))
    }

    /// Create a client with an explicit token source.
    pub fn with_token_source(
        config: VideoIntelConfig,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> VideoIntelResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("vidlens-videointel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(VideoIntelError::Network)?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> VideoIntelResult<Self> {
        Self::new(VideoIntelConfig::from_env()?)
    }

    pub fn config(&self) -> &VideoIntelConfig {
        &self.config
    }

    fn create_auth_provider(config: &VideoIntelConfig) -> VideoIntelResult<Arc<dyn TokenProvider>> {
        if let Some(path) = &config.credentials_path {
            let sa = CustomServiceAccount::from_file(path).map_err(|e| {
                VideoIntelError::auth_error(format!(
                    "Failed to load service account from {}: {}",
                    path.display(),
                    e
                ))
            })?;
            return Ok(Arc::new(sa));
        }

        let service_account = CustomServiceAccount::from_env()
            .map_err(|e| VideoIntelError::auth_error(format!("Failed to load service account: {}", e)))?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(VideoIntelError::auth_error(
                "No credentials found. Set VIDEOINTEL_CREDENTIALS or \
                 GOOGLE_APPLICATION_CREDENTIALS to a service account JSON file.",
            )),
        }
    }

    fn annotate_url(&self) -> String {
        format!("{}/v1/videos:annotate", self.config.base_url)
    }

    fn operation_url(&self, name: &str) -> String {
        format!("{}/v1/{}", self.config.base_url, name)
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Build the annotate request for inline video content.
    pub fn build_request(&self, video: &[u8]) -> AnnotateVideoRequest {
        let speech_transcription_config = self
            .config
            .features
            .contains(&Feature::SpeechTranscription)
            .then(|| SpeechTranscriptionConfig {
                language_code: self.config.language_code.clone(),
                enable_automatic_punctuation: true,
            });

        AnnotateVideoRequest {
            input_content: BASE64.encode(video),
            features: self.config.features.clone(),
            video_context: Some(VideoContext {
                segments: vec![VideoSegment::new(0, self.config.max_segment_secs)],
                speech_transcription_config,
            }),
        }
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Annotate inline video content and wait for the result.
    pub async fn annotate_content(&self, video: &[u8]) -> VideoIntelResult<RawAnnotationResult> {
        if video.is_empty() {
            return Err(VideoIntelError::request_failed("Video content is empty"));
        }

        let request = self.build_request(video);
        debug!(
            encoded_len = request.input_content.len(),
            features = ?self.config.features,
            "Submitting video for annotation"
        );

        let started = Instant::now();
        let operation = self.submit(&request).await?;
        info!(operation = %operation.name, "Annotation operation started");

        let result = self
            .wait_for_operation(operation)
            .await
            .and_then(Self::into_annotation_result);

        let outcome = if result.is_ok() { "success" } else { "failure" };
        record_operation_duration(outcome, started.elapsed().as_secs_f64());

        result
    }

    /// Submit an annotate request, returning the pending operation.
    ///
    /// Each accepted submit starts a new job, so only rejected or unsent
    /// requests are resent.
    pub async fn submit(&self, request: &AnnotateVideoRequest) -> VideoIntelResult<Operation> {
        let url = self.annotate_url();
        with_retry(&self.config.retry, "annotate", Replay::IfUnsent, || {
            self.send_json("annotate", || self.http.post(&url).json(request))
        })
        .await
    }

    /// Fetch the current state of an operation.
    pub async fn get_operation(&self, name: &str) -> VideoIntelResult<Operation> {
        let url = self.operation_url(name);
        with_retry(&self.config.retry, "get_operation", Replay::Safe, || {
            self.send_json("get_operation", || self.http.get(&url))
        })
        .await
    }

    /// Poll until the operation is done or the deadline passes.
    pub async fn wait_for_operation(&self, mut operation: Operation) -> VideoIntelResult<Operation> {
        let deadline = Instant::now() + self.config.operation_timeout;
        let name = operation.name.clone();

        while !operation.done {
            if Instant::now() >= deadline {
                warn!(operation = %name, "Annotation operation timed out");
                let deadline_ms = self.config.operation_timeout.as_millis() as u64;
                return Err(VideoIntelError::Timeout(deadline_ms));
            }

            tokio::time::sleep(self.config.poll_interval).await;
            operation = self.get_operation(&name).await?;

            if let Some(percent) = operation.metadata.as_ref().and_then(|m| m.overall_percent()) {
                debug!(operation = %name, progress = percent, "Waiting for annotation");
            }
        }

        Ok(operation)
    }

    /// Extract the first annotation result from a finished operation.
    fn into_annotation_result(operation: Operation) -> VideoIntelResult<RawAnnotationResult> {
        if let Some(error) = operation.error {
            return Err(VideoIntelError::OperationFailed(error.to_string()));
        }

        let response = operation.response.ok_or_else(|| {
            VideoIntelError::invalid_response("Operation finished without a response")
        })?;

        let count = response.annotation_results.len();
        let result = response.annotation_results.into_iter().next().ok_or_else(|| {
            VideoIntelError::invalid_response("Invalid response from Video Intelligence API")
        })?;

        if count > 1 {
            debug!(count, "Using the first of several annotation results");
        }
        if let Some(ref error) = result.error {
            warn!("Video Intelligence reported a partial failure: {}", error);
        }

        Ok(result)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Send an authorized request and decode the JSON response.
    ///
    /// A 401 caused by an expired token invalidates the cache and retries once.
    async fn send_json<T, F>(&self, operation: &str, make: F) -> VideoIntelResult<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        self.execute_request(operation, async {
            let mut token = self.tokens.access_token().await?;
            let mut response = make().bearer_auth(&token).send().await?;
            let mut status = response.status();

            if status == StatusCode::UNAUTHORIZED {
                let body = response.text().await.unwrap_or_default();
                if Self::is_access_token_expired(&body) {
                    self.tokens.invalidate().await;
                    token = self.tokens.access_token().await?;
                    response = make().bearer_auth(&token).send().await?;
                    status = response.status();
                } else {
                    return Err(VideoIntelError::from_http_status(status.as_u16(), body));
                }
            }

            if status.is_success() {
                let body = response.text().await?;
                Ok(serde_json::from_str::<T>(&body)?)
            } else {
                Err(Self::handle_error_response(status, response).await)
            }
        })
        .await
    }

    async fn execute_request<T, Fut>(&self, operation: &str, fut: Fut) -> VideoIntelResult<T>
    where
        Fut: std::future::Future<Output = VideoIntelResult<T>>,
    {
        let span = info_span!("videointel_request", operation = %operation);

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> VideoIntelError {
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);

        let body = response.text().await.unwrap_or_default();

        match (status, retry_after_ms) {
            (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => VideoIntelError::RateLimited(ms),
            _ => VideoIntelError::from_http_status(status.as_u16(), body),
        }
    }
}

#[async_trait]
impl AnnotationProvider for VideoIntelClient {
    fn name(&self) -> &'static str {
        "google-video-intelligence"
    }

    async fn annotate(&self, video: &VideoUpload) -> ProviderResult<RawAnnotationResult> {
        if video.is_empty() {
            return Err(ProviderError::EmptyVideo);
        }
        Ok(self.annotate_content(&video.bytes).await?)
    }

    async fn check_ready(&self) -> ProviderResult<()> {
        self.tokens.access_token().await?;
        Ok(())
    }
}
