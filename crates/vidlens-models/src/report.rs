//! Timeline and report models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Convert a provider confidence fraction into a whole percentage.
///
/// Values are rounded to the nearest integer and clamped to `0..=100`;
/// non-finite input maps to 0.
pub fn confidence_percent(fraction: f64) -> u8 {
    if !fraction.is_finite() {
        return 0;
    }
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}

/// A single entry on the merged timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEvent {
    /// Offset from the start of the video, in whole seconds
    pub time: u64,
    /// Human-readable description
    pub event: String,
    /// Confidence percentage (0-100)
    pub confidence: u8,
}

impl TimelineEvent {
    pub fn new(time: u64, event: impl Into<String>, confidence: u8) -> Self {
        Self {
            time,
            event: event.into(),
            confidence: confidence.min(100),
        }
    }
}

/// A high-confidence label reported in summary mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LabelSummary {
    pub description: String,
    /// Confidence percentage (0-100)
    pub confidence: u8,
}

/// Final output of the reduction pipeline, returned to the client as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    /// Rendered multi-line analysis text
    pub analysis: String,

    /// Aggregate confidence percentage (0-100)
    pub confidence: u8,

    /// High-confidence labels (summary mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<LabelSummary>>,
}

/// JSON Schema of [`AnalysisReport`], served to clients that validate responses.
pub fn report_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(AnalysisReport)).unwrap_or(serde_json::Value::Null)
}
