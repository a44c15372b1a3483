//! Annotation normalization.
//!
//! Each category is converted independently into `TimelineEvent`s. Absent
//! categories and missing fields produce no events or zero values; nothing
//! here can fail.

use tracing::debug;
use vidlens_models::{
    confidence_percent, format_time, LabelAnnotation, ObjectTrackingAnnotation,
    PersonDetectionAnnotation, RawAnnotationResult, SpeechTranscription, TimelineEvent,
    VideoSegment,
};

/// Shots carry no confidence from the provider.
const SHOT_CONFIDENCE: u8 = 100;

/// Normalize every category in the fixed order labels, objects, persons,
/// speech, shots. The order is what breaks ties between equal timestamps
/// once merged.
pub fn normalize(raw: &RawAnnotationResult) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    events.extend(normalize_labels(raw.labels()));
    events.extend(normalize_objects(raw.objects()));
    events.extend(normalize_persons(raw.persons()));
    events.extend(normalize_speech(raw.speech()));
    events.extend(normalize_shots(raw.shots()));
    events
}

/// One event per label segment, at the segment start.
pub fn normalize_labels(labels: &[LabelAnnotation]) -> Vec<TimelineEvent> {
    debug!(count = labels.len(), "Normalizing label annotations");

    labels
        .iter()
        .flat_map(|label| {
            let description = label.description();
            label.segments.iter().map(move |segment| {
                TimelineEvent::new(
                    segment.start_secs(),
                    format!(
                        "{} detected (until {})",
                        description,
                        format_time(segment.end_secs())
                    ),
                    confidence_percent(segment.confidence.unwrap_or(0.0)),
                )
            })
        })
        .collect()
}

/// One event per observed frame of each tracked object.
///
/// Only the frame's own confidence counts; a frame without one scores 0
/// even when the track carries a confidence.
pub fn normalize_objects(objects: &[ObjectTrackingAnnotation]) -> Vec<TimelineEvent> {
    debug!(count = objects.len(), "Normalizing object annotations");

    objects
        .iter()
        .flat_map(|object| {
            let text = format!("{} tracked", object.description());
            object.frames.iter().map(move |frame| {
                let confidence = frame.confidence.unwrap_or(0.0);
                TimelineEvent::new(frame.time_secs(), text.clone(), confidence_percent(confidence))
            })
        })
        .collect()
}

/// One event per person track, at the track start.
pub fn normalize_persons(persons: &[PersonDetectionAnnotation]) -> Vec<TimelineEvent> {
    debug!(count = persons.len(), "Normalizing person detections");

    persons
        .iter()
        .flat_map(|person| person.tracks.iter())
        .map(|track| {
            TimelineEvent::new(
                track.start_secs(),
                format!("Person detected (until {})", format_time(track.end_secs())),
                confidence_percent(track.confidence.unwrap_or(0.0)),
            )
        })
        .collect()
}

/// One event per timed word, carrying the whole alternative's transcript
/// and confidence. Alternatives without word timing are skipped.
pub fn normalize_speech(transcriptions: &[SpeechTranscription]) -> Vec<TimelineEvent> {
    debug!(count = transcriptions.len(), "Normalizing speech transcriptions");

    transcriptions
        .iter()
        .flat_map(|transcription| transcription.alternatives.iter())
        .filter(|alternative| !alternative.words.is_empty())
        .flat_map(|alternative| {
            let text = format!(
                "Speech: \"{}\"",
                alternative.transcript.as_deref().unwrap_or_default()
            );
            let confidence = confidence_percent(alternative.confidence.unwrap_or(0.0));
            alternative
                .words
                .iter()
                .map(move |word| TimelineEvent::new(word.start_secs(), text.clone(), confidence))
        })
        .collect()
}

/// One event per shot boundary.
pub fn normalize_shots(shots: &[VideoSegment]) -> Vec<TimelineEvent> {
    debug!(count = shots.len(), "Normalizing shot changes");

    shots
        .iter()
        .map(|shot| {
            TimelineEvent::new(
                shot.start_secs(),
                format!("New scene detected (until {})", format_time(shot.end_secs())),
                SHOT_CONFIDENCE,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidlens_models::{
        Entity, LabelSegment, ObjectFrame, SpeechAlternative, TimeOffset, Track, WordInfo,
    };

    fn label(name: &str, segments: Vec<LabelSegment>) -> LabelAnnotation {
        LabelAnnotation {
            entity: Some(Entity::named(name)),
            segments,
            ..Default::default()
        }
    }

    #[test]
    fn test_labels_one_event_per_segment() {
        let events = normalize_labels(&[label(
            "Drone",
            vec![LabelSegment::new(0, 5, 0.9), LabelSegment::new(70, 3700, 0.456)],
        )]);

        assert_eq!(
            events,
            vec![
                TimelineEvent::new(0, "Drone detected (until 00:05)", 90),
                TimelineEvent::new(70, "Drone detected (until 01:01:40)", 46),
            ]
        );
    }

    #[test]
    fn test_label_missing_fields_default_to_zero() {
        let events = normalize_labels(&[label("Sky", vec![LabelSegment::default()])]);
        assert_eq!(events, vec![TimelineEvent::new(0, "Sky detected (until 00:00)", 0)]);
    }

    #[test]
    fn test_objects_frame_without_confidence_scores_zero() {
        let object = ObjectTrackingAnnotation {
            entity: Some(Entity::named("car")),
            confidence: Some(0.75),
            frames: vec![
                ObjectFrame {
                    time_offset: Some(TimeOffset::from_secs(2)),
                    confidence: Some(0.6),
                },
                ObjectFrame {
                    time_offset: Some(TimeOffset { seconds: 3, nanos: 900_000_000 }),
                    confidence: None,
                },
            ],
            ..Default::default()
        };

        let events = normalize_objects(&[object]);
        assert_eq!(
            events,
            vec![
                TimelineEvent::new(2, "car tracked", 60),
                TimelineEvent::new(3, "car tracked", 0),
            ]
        );
    }

    #[test]
    fn test_objects_without_any_confidence() {
        let object = ObjectTrackingAnnotation {
            frames: vec![ObjectFrame::default()],
            ..Default::default()
        };
        assert_eq!(
            normalize_objects(&[object]),
            vec![TimelineEvent::new(0, "Unknown tracked", 0)]
        );
    }

    #[test]
    fn test_persons_one_event_per_track() {
        let person = PersonDetectionAnnotation {
            tracks: vec![
                Track {
                    segment: Some(VideoSegment::new(4, 9)),
                    confidence: Some(0.88),
                },
                Track::default(),
            ],
        };

        assert_eq!(
            normalize_persons(&[person]),
            vec![
                TimelineEvent::new(4, "Person detected (until 00:09)", 88),
                TimelineEvent::new(0, "Person detected (until 00:00)", 0),
            ]
        );
    }

    #[test]
    fn test_speech_emits_alternative_text_per_word() {
        let word = |secs| WordInfo {
            start_time: Some(TimeOffset::from_secs(secs)),
            ..Default::default()
        };
        let transcription = SpeechTranscription {
            alternatives: vec![
                SpeechAlternative {
                    transcript: Some("hello world".to_string()),
                    confidence: Some(0.91),
                    words: vec![word(1), word(2)],
                },
                // No word timing: skipped
                SpeechAlternative {
                    transcript: Some("hollow world".to_string()),
                    confidence: Some(0.4),
                    words: vec![],
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            normalize_speech(&[transcription]),
            vec![
                TimelineEvent::new(1, "Speech: \"hello world\"", 91),
                TimelineEvent::new(2, "Speech: \"hello world\"", 91),
            ]
        );
    }

    #[test]
    fn test_shots_fixed_confidence() {
        let events = normalize_shots(&[VideoSegment::new(0, 5), VideoSegment::new(5, 12)]);
        assert_eq!(
            events,
            vec![
                TimelineEvent::new(0, "New scene detected (until 00:05)", 100),
                TimelineEvent::new(5, "New scene detected (until 00:12)", 100),
            ]
        );
    }

    #[test]
    fn test_normalize_category_order() {
        let raw = RawAnnotationResult {
            shot_annotations: Some(vec![VideoSegment::new(0, 5)]),
            segment_label_annotations: Some(vec![label("Drone", vec![LabelSegment::new(0, 5, 0.9)])]),
            ..Default::default()
        };

        let events = normalize(&raw);
        assert_eq!(events.len(), 2);
        assert!(events[0].event.starts_with("Drone"));
        assert!(events[1].event.starts_with("New scene"));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&RawAnnotationResult::default()).is_empty());
    }
}
