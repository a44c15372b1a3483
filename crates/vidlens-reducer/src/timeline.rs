//! Timeline merging and rendering.

use vidlens_models::{format_time, TimelineEvent};

/// First line of every rendered timeline.
pub const TIMELINE_HEADER: &str = "Timeline Analysis:\n\n";

/// Appended instead of event lines when nothing was detected.
pub const NO_EVENTS_NOTE: &str = "No significant events detected in the video.\n\
This might be due to:\n\
- Video quality or length issues\n\
- Content not matching expected patterns\n\
- Processing limitations\n";

/// Events ordered by time. Immutable once merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    events: Vec<TimelineEvent>,
}

impl Timeline {
    /// Sort events ascending by time.
    ///
    /// The sort is stable: events sharing a timestamp keep their input order.
    pub fn merge(mut events: Vec<TimelineEvent>) -> Self {
        events.sort_by_key(|event| event.time);
        Self { events }
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Render the report text: header, then one line per event.
    pub fn render(&self) -> String {
        let mut out = String::from(TIMELINE_HEADER);

        if self.events.is_empty() {
            out.push_str(NO_EVENTS_NOTE);
            return out;
        }

        for event in &self.events {
            out.push_str(&format!(
                "{}: {} ({}% confidence)\n",
                format_time(event.time),
                event.event,
                event.confidence
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sorts_by_time() {
        let timeline = Timeline::merge(vec![
            TimelineEvent::new(30, "c", 10),
            TimelineEvent::new(0, "a", 10),
            TimelineEvent::new(12, "b", 10),
        ]);

        let times: Vec<u64> = timeline.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![0, 12, 30]);
    }

    #[test]
    fn test_merge_is_stable_for_equal_times() {
        let timeline = Timeline::merge(vec![
            TimelineEvent::new(5, "label", 90),
            TimelineEvent::new(1, "early", 90),
            TimelineEvent::new(5, "object", 80),
            TimelineEvent::new(5, "shot", 100),
        ]);

        let names: Vec<&str> = timeline.events().iter().map(|e| e.event.as_str()).collect();
        assert_eq!(names, vec!["early", "label", "object", "shot"]);
    }

    #[test]
    fn test_render_lines() {
        let timeline = Timeline::merge(vec![
            TimelineEvent::new(65, "Dog detected (until 01:10)", 77),
            TimelineEvent::new(3661, "New scene detected (until 01:02:00)", 100),
        ]);

        assert_eq!(
            timeline.render(),
            "Timeline Analysis:\n\n\
             01:05: Dog detected (until 01:10) (77% confidence)\n\
             01:01:01: New scene detected (until 01:02:00) (100% confidence)\n"
        );
    }

    #[test]
    fn test_render_empty_timeline() {
        let rendered = Timeline::default().render();
        assert!(rendered.starts_with(TIMELINE_HEADER));
        assert!(rendered.contains("No significant events detected in the video."));
        assert!(rendered.ends_with("- Processing limitations\n"));
    }
}
