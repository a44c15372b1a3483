//! Video Intelligence v1 REST request and operation types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vidlens_models::{AnnotationStatus, RawAnnotationResult, VideoSegment};

/// Annotation feature requested from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    LabelDetection,
    ObjectTracking,
    ShotChangeDetection,
    PersonDetection,
    SpeechTranscription,
}

impl Feature {
    /// Features requested when none are configured.
    pub const DEFAULTS: [Feature; 3] = [
        Feature::LabelDetection,
        Feature::ObjectTracking,
        Feature::ShotChangeDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabelDetection => "LABEL_DETECTION",
            Self::ObjectTracking => "OBJECT_TRACKING",
            Self::ShotChangeDetection => "SHOT_CHANGE_DETECTION",
            Self::PersonDetection => "PERSON_DETECTION",
            Self::SpeechTranscription => "SPEECH_TRANSCRIPTION",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LABEL_DETECTION" => Ok(Self::LabelDetection),
            "OBJECT_TRACKING" => Ok(Self::ObjectTracking),
            "SHOT_CHANGE_DETECTION" => Ok(Self::ShotChangeDetection),
            "PERSON_DETECTION" => Ok(Self::PersonDetection),
            "SPEECH_TRANSCRIPTION" => Ok(Self::SpeechTranscription),
            other => Err(format!("unsupported feature '{}'", other)),
        }
    }
}

/// `videos:annotate` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateVideoRequest {
    pub input_content: String,
    pub features: Vec<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_context: Option<VideoContext>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoContext {
    pub segments: Vec<VideoSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_transcription_config: Option<SpeechTranscriptionConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechTranscriptionConfig {
    pub language_code: String,
    pub enable_automatic_punctuation: bool,
}

/// Long-running operation returned by `videos:annotate`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub metadata: Option<OperationMetadata>,
    #[serde(default)]
    pub error: Option<AnnotationStatus>,
    #[serde(default)]
    pub response: Option<AnnotateVideoResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationMetadata {
    pub annotation_progress: Vec<AnnotationProgress>,
}

impl OperationMetadata {
    /// Lowest progress across features, the closest thing to overall progress.
    pub fn overall_percent(&self) -> Option<i32> {
        self.annotation_progress
            .iter()
            .map(|p| p.progress_percent.unwrap_or(0))
            .min()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotationProgress {
    pub feature: Option<String>,
    pub progress_percent: Option<i32>,
}

/// Final payload of a finished operation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnotateVideoResponse {
    pub annotation_results: Vec<RawAnnotationResult>,
}
