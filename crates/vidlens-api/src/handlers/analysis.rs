//! Video analysis handler.
//!
//! Accepts a `multipart/form-data` upload with:
//! - `video`: the video file (required)
//! - `query`: free-text question about the video (optional)
//! - `mode`: `timeline` or `summary` (optional, defaults to `ANALYSIS_MODE`)

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info};
use vidlens_models::AnalysisReport;
use vidlens_reducer::{AnalysisRequest, ReductionStrategy, VideoUpload};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field names.
const VIDEO_FIELD: &str = "video";
const QUERY_FIELD: &str = "query";
const MODE_FIELD: &str = "mode";

/// Parsed multipart form.
#[derive(Debug, Default)]
struct AnalyzeForm {
    video: Option<VideoUpload>,
    query: Option<String>,
    mode: Option<ReductionStrategy>,
}

/// Read the form, rejecting a `video` part larger than `limit` bytes.
async fn read_form(multipart: &mut Multipart, limit: usize) -> ApiResult<AnalyzeForm> {
    let mut form = AnalyzeForm::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_multipart(e, limit))?
    {
        let name = field.name().unwrap_or_default().to_string();

        match name.as_str() {
            VIDEO_FIELD => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);

                let mut bytes = Vec::new();
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::from_multipart(e, limit))?
                {
                    if bytes.len() + chunk.len() > limit {
                        return Err(ApiError::PayloadTooLarge(limit));
                    }
                    bytes.extend_from_slice(&chunk);
                }

                let mut upload = VideoUpload::new(bytes);
                if let Some(content_type) = content_type {
                    upload = upload.with_content_type(content_type);
                }
                if let Some(file_name) = file_name {
                    upload = upload.with_file_name(file_name);
                }
                form.video = Some(upload);
            }
            QUERY_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_multipart(e, limit))?;
                form.query = Some(text).filter(|q| !q.trim().is_empty());
            }
            MODE_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::from_multipart(e, limit))?;
                if !text.trim().is_empty() {
                    form.mode = Some(text.parse()?);
                }
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Analyze an uploaded video.
///
/// POST /api/analyze-video
pub async fn analyze_video(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<AnalysisReport>> {
    let form = read_form(&mut multipart, state.config.max_upload_size).await?;

    let video = form
        .video
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::NoVideo)?;

    let strategy = form
        .mode
        .unwrap_or_else(|| state.analyzer.default_strategy());

    info!(
        size_bytes = video.len(),
        file_name = video.file_name.as_deref().unwrap_or("unknown"),
        strategy = %strategy,
        "Received video for analysis"
    );
    metrics::record_upload_bytes(video.len());

    let mut request = AnalysisRequest::new(video).with_strategy(strategy);
    if let Some(query) = form.query {
        request = request.with_query(query);
    }

    let start = Instant::now();
    let result = state.analyzer.analyze_video(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(report) => {
            metrics::record_analysis(strategy.as_str(), "success", elapsed);
            metrics::record_report_confidence(strategy.as_str(), report.confidence);
            Ok(Json(report))
        }
        Err(e) => {
            metrics::record_analysis(strategy.as_str(), "failure", elapsed);
            Err(ApiError::from_provider(e, !state.config.is_production()))
        }
    }
}

/// JSON Schema of the analysis response.
///
/// GET /api/schema
pub async fn report_schema() -> Json<serde_json::Value> {
    Json(vidlens_models::report_schema())
}
