//! Aggregate confidence over label annotations.

use vidlens_models::{confidence_percent, LabelAnnotation, LabelSummary};

/// Labels whose first-segment confidence exceeds this fraction are reported
/// in summary mode.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Mean first-segment confidence across labels, as a percentage.
///
/// Only each label's first segment counts; later segments are ignored.
/// Returns 0 for an empty set.
pub fn aggregate_confidence(labels: &[LabelAnnotation]) -> u8 {
    if labels.is_empty() {
        return 0;
    }

    let sum: f64 = labels
        .iter()
        .map(LabelAnnotation::first_segment_confidence)
        .sum();

    confidence_percent(sum / labels.len() as f64)
}

/// Labels above `HIGH_CONFIDENCE_THRESHOLD`, in provider order.
pub fn high_confidence_labels(labels: &[LabelAnnotation]) -> Vec<LabelSummary> {
    labels
        .iter()
        .filter(|label| label.first_segment_confidence() > HIGH_CONFIDENCE_THRESHOLD)
        .map(|label| LabelSummary {
            description: label.description().to_string(),
            confidence: confidence_percent(label.first_segment_confidence()),
        })
        .collect()
}
