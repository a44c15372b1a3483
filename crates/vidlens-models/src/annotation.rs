//! Raw annotation result models.
//!
//! These mirror the provider's REST JSON for a single annotated video.
//! Every collection and scalar is optional: a missing category means
//! "no data", never an error.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::timestamp::parse_duration;

/// Placeholder rendered when the provider omits an entity description.
pub const UNKNOWN_ENTITY: &str = "Unknown";

// ============================================================================
// Time offsets
// ============================================================================

/// A provider time offset relative to the start of the video.
///
/// Accepts both the protobuf JSON string form (`"12.500s"`) and the
/// object form (`{"seconds": "12", "nanos": 500000000}`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeOffset {
    pub seconds: i64,
    pub nanos: i32,
}

impl TimeOffset {
    pub fn from_secs(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }

    /// Whole seconds used on the timeline. The fractional part is dropped
    /// and negative offsets clamp to zero.
    pub fn whole_seconds(&self) -> u64 {
        self.seconds.max(0) as u64
    }
}

impl fmt::Display for TimeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nanos == 0 {
            write!(f, "{}s", self.seconds)
        } else {
            let sign = if self.seconds < 0 || self.nanos < 0 { "-" } else { "" };
            let frac = format!("{:09}", self.nanos.unsigned_abs());
            write!(
                f,
                "{}{}.{}s",
                sign,
                self.seconds.unsigned_abs(),
                frac.trim_end_matches('0')
            )
        }
    }
}

impl Serialize for TimeOffset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SecondsRepr {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SecondsRepr {
    fn to_seconds(&self) -> i64 {
        match self {
            SecondsRepr::Int(v) => *v,
            SecondsRepr::Float(v) if v.is_finite() => v.trunc() as i64,
            SecondsRepr::Float(_) => 0,
            SecondsRepr::Text(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimeOffsetRepr {
    Text(String),
    Parts {
        #[serde(default)]
        seconds: Option<SecondsRepr>,
        #[serde(default)]
        nanos: Option<i32>,
    },
}

impl<'de> Deserialize<'de> for TimeOffset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TimeOffsetRepr::deserialize(deserializer)
            .map_err(|_| de::Error::custom("expected a duration string or {seconds, nanos}"))?;

        // Unparseable values degrade to zero rather than failing the whole result.
        Ok(match repr {
            TimeOffsetRepr::Text(text) => parse_duration(&text)
                .map(|(seconds, nanos)| TimeOffset { seconds, nanos })
                .unwrap_or_default(),
            TimeOffsetRepr::Parts { seconds, nanos } => TimeOffset {
                seconds: seconds.map(|s| s.to_seconds()).unwrap_or(0),
                nanos: nanos.unwrap_or(0),
            },
        })
    }
}

fn whole_seconds(offset: Option<&TimeOffset>) -> u64 {
    offset.map(TimeOffset::whole_seconds).unwrap_or(0)
}

// ============================================================================
// Shared shapes
// ============================================================================

/// A time range within the video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSegment {
    pub start_time_offset: Option<TimeOffset>,
    pub end_time_offset: Option<TimeOffset>,
}

impl VideoSegment {
    pub fn new(start_secs: i64, end_secs: i64) -> Self {
        Self {
            start_time_offset: Some(TimeOffset::from_secs(start_secs)),
            end_time_offset: Some(TimeOffset::from_secs(end_secs)),
        }
    }

    /// Start in whole seconds (0 when missing).
    pub fn start_secs(&self) -> u64 {
        whole_seconds(self.start_time_offset.as_ref())
    }

    /// End in whole seconds (0 when missing).
    pub fn end_secs(&self) -> u64 {
        whole_seconds(self.end_time_offset.as_ref())
    }
}

/// Detected entity (label or tracked object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Entity {
    pub entity_id: Option<String>,
    pub description: Option<String>,
    pub language_code: Option<String>,
}

impl Entity {
    pub fn named(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }
}

/// Missing entity or description reads as `Unknown`; an empty description is kept.
fn describe(entity: Option<&Entity>) -> &str {
    entity
        .and_then(|e| e.description.as_deref())
        .unwrap_or(UNKNOWN_ENTITY)
}

/// Per-video error status reported by the provider (`google.rpc.Status`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStatus {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.message.as_deref()) {
            (Some(code), Some(msg)) => write!(f, "{} (code {})", msg, code),
            (None, Some(msg)) => f.write_str(msg),
            (Some(code), None) => write!(f, "error code {}", code),
            (None, None) => f.write_str("unknown error"),
        }
    }
}

// ============================================================================
// Label detection
// ============================================================================

/// A label detected across one or more video segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelAnnotation {
    pub entity: Option<Entity>,
    pub category_entities: Vec<Entity>,
    pub segments: Vec<LabelSegment>,
}

impl LabelAnnotation {
    pub fn description(&self) -> &str {
        describe(self.entity.as_ref())
    }

    /// Confidence of the first reported segment, 0 when absent.
    pub fn first_segment_confidence(&self) -> f64 {
        self.segments
            .first()
            .and_then(|s| s.confidence)
            .unwrap_or(0.0)
    }
}

/// One occurrence of a label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelSegment {
    pub segment: Option<VideoSegment>,
    pub confidence: Option<f64>,
}

impl LabelSegment {
    pub fn new(start_secs: i64, end_secs: i64, confidence: f64) -> Self {
        Self {
            segment: Some(VideoSegment::new(start_secs, end_secs)),
            confidence: Some(confidence),
        }
    }

    pub fn start_secs(&self) -> u64 {
        self.segment.as_ref().map(VideoSegment::start_secs).unwrap_or(0)
    }

    pub fn end_secs(&self) -> u64 {
        self.segment.as_ref().map(VideoSegment::end_secs).unwrap_or(0)
    }
}

// ============================================================================
// Object tracking
// ============================================================================

/// A tracked object and the frames it was observed in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectTrackingAnnotation {
    pub entity: Option<Entity>,
    pub confidence: Option<f64>,
    pub track_id: Option<String>,
    pub segment: Option<VideoSegment>,
    pub frames: Vec<ObjectFrame>,
}

impl ObjectTrackingAnnotation {
    pub fn description(&self) -> &str {
        describe(self.entity.as_ref())
    }
}

/// A single observation of a tracked object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectFrame {
    pub time_offset: Option<TimeOffset>,
    pub confidence: Option<f64>,
}

impl ObjectFrame {
    pub fn time_secs(&self) -> u64 {
        whole_seconds(self.time_offset.as_ref())
    }
}

// ============================================================================
// Person detection
// ============================================================================

/// All tracks belonging to one detected person.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonDetectionAnnotation {
    pub tracks: Vec<Track>,
}

/// A time span over which a person was tracked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Track {
    pub segment: Option<VideoSegment>,
    pub confidence: Option<f64>,
}

impl Track {
    pub fn start_secs(&self) -> u64 {
        self.segment.as_ref().map(VideoSegment::start_secs).unwrap_or(0)
    }

    pub fn end_secs(&self) -> u64 {
        self.segment.as_ref().map(VideoSegment::end_secs).unwrap_or(0)
    }
}

// ============================================================================
// Speech transcription
// ============================================================================

/// Transcription of one portion of the audio track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechTranscription {
    pub alternatives: Vec<SpeechAlternative>,
    pub language_code: Option<String>,
}

/// One candidate transcript with optional word-level timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechAlternative {
    pub transcript: Option<String>,
    pub confidence: Option<f64>,
    pub words: Vec<WordInfo>,
}

/// Word-level timing for a transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WordInfo {
    pub start_time: Option<TimeOffset>,
    pub end_time: Option<TimeOffset>,
    pub word: Option<String>,
    pub confidence: Option<f64>,
    pub speaker_tag: Option<i32>,
}

impl WordInfo {
    pub fn start_secs(&self) -> u64 {
        whole_seconds(self.start_time.as_ref())
    }
}

// ============================================================================
// Result
// ============================================================================

/// Annotation result for a single video.
///
/// Every category is independently optional. Use the slice accessors for
/// null-safe iteration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAnnotationResult {
    pub input_uri: Option<String>,
    /// Span of the video that was analyzed
    pub segment: Option<VideoSegment>,
    pub segment_label_annotations: Option<Vec<LabelAnnotation>>,
    pub object_annotations: Option<Vec<ObjectTrackingAnnotation>>,
    pub person_detection_annotations: Option<Vec<PersonDetectionAnnotation>>,
    pub speech_transcriptions: Option<Vec<SpeechTranscription>>,
    pub shot_annotations: Option<Vec<VideoSegment>>,
    /// Per-video failure reported alongside partial results
    pub error: Option<AnnotationStatus>,
}

impl RawAnnotationResult {
    pub fn labels(&self) -> &[LabelAnnotation] {
        self.segment_label_annotations.as_deref().unwrap_or(&[])
    }

    pub fn objects(&self) -> &[ObjectTrackingAnnotation] {
        self.object_annotations.as_deref().unwrap_or(&[])
    }

    pub fn persons(&self) -> &[PersonDetectionAnnotation] {
        self.person_detection_annotations.as_deref().unwrap_or(&[])
    }

    pub fn speech(&self) -> &[SpeechTranscription] {
        self.speech_transcriptions.as_deref().unwrap_or(&[])
    }

    pub fn shots(&self) -> &[VideoSegment] {
        self.shot_annotations.as_deref().unwrap_or(&[])
    }

    /// Analyzed duration in whole seconds, 0 when the provider omits it.
    pub fn total_duration_secs(&self) -> u64 {
        self.segment.as_ref().map(VideoSegment::end_secs).unwrap_or(0)
    }

    /// True when no annotation category carries any data.
    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
            && self.objects().is_empty()
            && self.persons().is_empty()
            && self.speech().is_empty()
            && self.shots().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_time_offset_string_form() {
        let offset: TimeOffset = serde_json::from_value(json!("12.500s")).unwrap();
        assert_eq!(offset, TimeOffset { seconds: 12, nanos: 500_000_000 });
        assert_eq!(offset.whole_seconds(), 12);
    }

    #[test]
    fn test_time_offset_object_form() {
        let offset: TimeOffset =
            serde_json::from_value(json!({"seconds": "7", "nanos": 250000000})).unwrap();
        assert_eq!(offset.whole_seconds(), 7);

        let offset: TimeOffset = serde_json::from_value(json!({"seconds": 42})).unwrap();
        assert_eq!(offset.whole_seconds(), 42);

        // Sub-second offsets omit `seconds` entirely
        let offset: TimeOffset = serde_json::from_value(json!({"nanos": 400000000})).unwrap();
        assert_eq!(offset.whole_seconds(), 0);
    }

    #[test]
    fn test_time_offset_negative_clamps_to_zero() {
        let offset = TimeOffset::from_secs(-3);
        assert_eq!(offset.whole_seconds(), 0);
    }

    #[test]
    fn test_time_offset_display() {
        assert_eq!(TimeOffset::from_secs(60).to_string(), "60s");
        assert_eq!(TimeOffset { seconds: 1, nanos: 500_000_000 }.to_string(), "1.5s");
        assert_eq!(serde_json::to_value(TimeOffset::from_secs(0)).unwrap(), json!("0s"));
    }

    #[test]
    fn test_empty_object_deserializes() {
        let raw: RawAnnotationResult = serde_json::from_value(json!({})).unwrap();
        assert!(raw.is_empty());
        assert!(raw.labels().is_empty());
        assert_eq!(raw.total_duration_secs(), 0);
    }

    #[test]
    fn test_provider_payload_deserializes() {
        let raw: RawAnnotationResult = serde_json::from_value(json!({
            "inputUri": "",
            "segment": {"startTimeOffset": "0s", "endTimeOffset": "42.033s"},
            "segmentLabelAnnotations": [{
                "entity": {"entityId": "/m/0k4j", "description": "car", "languageCode": "en-US"},
                "categoryEntities": [{"entityId": "/m/07yv9", "description": "vehicle"}],
                "segments": [{
                    "segment": {"startTimeOffset": "0s", "endTimeOffset": "42.033s"},
                    "confidence": 0.93
                }]
            }],
            "shotAnnotations": [{"startTimeOffset": "0s", "endTimeOffset": "12.512s"}],
            "objectAnnotations": [{
                "entity": {"description": "person"},
                "confidence": 0.81,
                "frames": [{
                    "normalizedBoundingBox": {"left": 0.1, "top": 0.2, "right": 0.4, "bottom": 0.9},
                    "timeOffset": "3.400s"
                }],
                "trackId": "7"
            }]
        }))
        .unwrap();

        assert_eq!(raw.total_duration_secs(), 42);
        assert_eq!(raw.labels()[0].description(), "car");
        assert_eq!(raw.labels()[0].first_segment_confidence(), 0.93);
        assert_eq!(raw.labels()[0].segments[0].end_secs(), 42);
        assert_eq!(raw.shots()[0].end_secs(), 12);
        assert_eq!(raw.objects()[0].frames[0].time_secs(), 3);
        assert_eq!(raw.objects()[0].frames[0].confidence, None);
        assert!(raw.persons().is_empty());
    }

    #[test]
    fn test_missing_entity_description() {
        let label = LabelAnnotation::default();
        assert_eq!(label.description(), UNKNOWN_ENTITY);
        assert_eq!(label.first_segment_confidence(), 0.0);
    }

    #[test]
    fn test_empty_entity_description_is_kept() {
        let object: ObjectTrackingAnnotation =
            serde_json::from_value(json!({"entity": {"description": ""}})).unwrap();
        assert_eq!(object.description(), "");

        let object: ObjectTrackingAnnotation =
            serde_json::from_value(json!({"entity": {}})).unwrap();
        assert_eq!(object.description(), UNKNOWN_ENTITY);
    }
}
