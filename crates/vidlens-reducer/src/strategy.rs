//! Reduction strategies.
//!
//! `Timeline` renders every normalized event; `Summary` reports only the
//! count of high-confidence labels and lists them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use vidlens_models::{AnalysisReport, RawAnnotationResult};

use crate::confidence::{aggregate_confidence, high_confidence_labels};
use crate::normalizer::normalize;
use crate::timeline::Timeline;

/// How a raw result is reduced into a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionStrategy {
    /// Full time-ordered event list
    #[default]
    Timeline,
    /// Count summary plus high-confidence labels
    Summary,
}

impl ReductionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeline => "timeline",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for ReductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a strategy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown analysis mode '{0}'. Expected 'timeline' or 'summary'")]
pub struct UnknownStrategy(pub String);

impl FromStr for ReductionStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timeline" => Ok(Self::Timeline),
            "summary" => Ok(Self::Summary),
            _ => Err(UnknownStrategy(s.to_string())),
        }
    }
}

/// Reduce a raw result with the given strategy.
pub fn reduce(raw: &RawAnnotationResult, strategy: ReductionStrategy) -> AnalysisReport {
    if let Some(ref error) = raw.error {
        info!("Provider reported a per-video error, reducing partial results: {}", error);
    }

    match strategy {
        ReductionStrategy::Timeline => reduce_timeline(raw),
        ReductionStrategy::Summary => reduce_summary(raw),
    }
}

fn reduce_timeline(raw: &RawAnnotationResult) -> AnalysisReport {
    let timeline = Timeline::merge(normalize(raw));

    if timeline.is_empty() {
        info!("No events detected in the video");
    } else {
        debug!(events = timeline.len(), "Merged timeline");
    }

    AnalysisReport {
        analysis: timeline.render(),
        confidence: aggregate_confidence(raw.labels()),
        labels: None,
    }
}

fn reduce_summary(raw: &RawAnnotationResult) -> AnalysisReport {
    let labels = high_confidence_labels(raw.labels());
    debug!(
        total = raw.labels().len(),
        relevant = labels.len(),
        "Selected high-confidence labels"
    );

    AnalysisReport {
        analysis: format!("Detected {} relevant objects/actions", labels.len()),
        confidence: aggregate_confidence(raw.labels()),
        labels: Some(labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidlens_models::{Entity, LabelAnnotation, LabelSegment, VideoSegment};

    fn drone_and_shot() -> RawAnnotationResult {
        RawAnnotationResult {
            segment_label_annotations: Some(vec![LabelAnnotation {
                entity: Some(Entity::named("Drone")),
                segments: vec![LabelSegment::new(0, 5, 0.9)],
                ..Default::default()
            }]),
            shot_annotations: Some(vec![VideoSegment::new(0, 5)]),
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("timeline".parse::<ReductionStrategy>(), Ok(ReductionStrategy::Timeline));
        assert_eq!(" Summary ".parse::<ReductionStrategy>(), Ok(ReductionStrategy::Summary));
        assert_eq!(
            "fancy".parse::<ReductionStrategy>(),
            Err(UnknownStrategy("fancy".to_string()))
        );
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for strategy in [ReductionStrategy::Timeline, ReductionStrategy::Summary] {
            assert_eq!(strategy.to_string().parse::<ReductionStrategy>(), Ok(strategy));
        }
    }

    #[test]
    fn test_timeline_drone_and_shot() {
        let report = reduce(&drone_and_shot(), ReductionStrategy::Timeline);

        assert_eq!(
            report.analysis,
            "Timeline Analysis:\n\n\
             00:00: Drone detected (until 00:05) (90% confidence)\n\
             00:00: New scene detected (until 00:05) (100% confidence)\n"
        );
        assert_eq!(report.confidence, 90);
        assert_eq!(report.labels, None);
    }

    #[test]
    fn test_summary_mode() {
        let report = reduce(&drone_and_shot(), ReductionStrategy::Summary);

        assert_eq!(report.analysis, "Detected 1 relevant objects/actions");
        assert_eq!(report.confidence, 90);
        let labels = report.labels.unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].description, "Drone");
        assert_eq!(labels[0].confidence, 90);
    }

    #[test]
    fn test_summary_mode_empty() {
        let report = reduce(&RawAnnotationResult::default(), ReductionStrategy::Summary);
        assert_eq!(report.analysis, "Detected 0 relevant objects/actions");
        assert_eq!(report.confidence, 0);
        assert_eq!(report.labels, Some(vec![]));
    }
}
