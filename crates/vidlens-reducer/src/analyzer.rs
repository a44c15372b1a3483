//! Pipeline orchestration.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};
use vidlens_models::{format_time, AnalysisReport, RawAnnotationResult};

use crate::provider::{AnnotationProvider, ProviderError, ProviderResult, VideoUpload};
use crate::strategy::{reduce, ReductionStrategy};

/// Reduce a raw result into the full timeline report.
pub fn analyze(raw: &RawAnnotationResult) -> AnalysisReport {
    reduce(raw, ReductionStrategy::Timeline)
}

/// A single analysis request.
#[derive(Debug, Clone, Default)]
pub struct AnalysisRequest {
    pub video: VideoUpload,
    /// Free-text query from the client. Logged and passed through; it does
    /// not change the reduction.
    pub query: Option<String>,
    /// Overrides the analyzer's default strategy
    pub strategy: Option<ReductionStrategy>,
}

impl AnalysisRequest {
    pub fn new(video: VideoUpload) -> Self {
        Self {
            video,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_strategy(mut self, strategy: ReductionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
}

/// Drives provider → normalize → merge → aggregate.
///
/// Stateless apart from the injected provider; safe to share across
/// concurrent requests.
#[derive(Clone)]
pub struct VideoAnalyzer {
    provider: Arc<dyn AnnotationProvider>,
    default_strategy: ReductionStrategy,
}

impl VideoAnalyzer {
    pub fn new(provider: Arc<dyn AnnotationProvider>) -> Self {
        Self {
            provider,
            default_strategy: ReductionStrategy::default(),
        }
    }

    pub fn with_default_strategy(mut self, strategy: ReductionStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }

    pub fn default_strategy(&self) -> ReductionStrategy {
        self.default_strategy
    }

    pub fn provider(&self) -> &Arc<dyn AnnotationProvider> {
        &self.provider
    }

    /// Submit the uploaded video to the provider and reduce its result.
    pub async fn analyze_video(&self, request: AnalysisRequest) -> ProviderResult<AnalysisReport> {
        if request.video.is_empty() {
            return Err(ProviderError::EmptyVideo);
        }

        let strategy = request.strategy.unwrap_or(self.default_strategy);
        let span = info_span!(
            "analyze_video",
            provider = self.provider.name(),
            strategy = %strategy,
            size_bytes = request.video.len()
        );

        async {
            info!(
                content_type = request.video.content_type.as_deref().unwrap_or("unknown"),
                query = request.query.as_deref().unwrap_or(""),
                "Processing video analysis request"
            );

            let raw = self.provider.annotate(&request.video).await?;
            Ok(self.reduce(&raw, request.query.as_deref(), strategy))
        }
        .instrument(span)
        .await
    }

    /// Reduce an already-resolved result. `query` is accepted for future
    /// query-conditioned analysis and currently ignored.
    pub fn reduce(
        &self,
        raw: &RawAnnotationResult,
        _query: Option<&str>,
        strategy: ReductionStrategy,
    ) -> AnalysisReport {
        info!(
            "Processing video of length: {}",
            format_time(raw.total_duration_secs())
        );
        let report = reduce(raw, strategy);
        info!(confidence = report.confidence, "Analysis complete");
        report
    }
}
