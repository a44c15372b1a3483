//! Shared data models for the vidlens backend.
//!
//! This crate provides Serde-serializable types for:
//! - Raw annotation results as returned by the video-analysis provider
//! - Timeline events and the final analysis report
//! - Time offset parsing and `[HH:]MM:SS` formatting

pub mod annotation;
pub mod report;
pub mod timestamp;

// Re-export common types
pub use annotation::{
    AnnotationStatus, Entity, LabelAnnotation, LabelSegment,
    ObjectFrame, ObjectTrackingAnnotation, PersonDetectionAnnotation, RawAnnotationResult,
    SpeechAlternative, SpeechTranscription, TimeOffset, Track, VideoSegment, WordInfo,
};
pub use report::{confidence_percent, report_schema, AnalysisReport, LabelSummary, TimelineEvent};
pub use timestamp::{format_time, parse_duration, TimestampError};
