//! Change-gated announcement decisions
//!
//! The announcers decide *what* is worth saying; the dispatcher decides
//! *when* it gets said. Both are plain state machines: feed them each
//! frame's result, speak whatever they hand back.

use guidelight_core::types::{Detection, DirectionVerdict};
use std::collections::BTreeSet;

/// The most recently spoken verdict.
///
/// Set once the first announcement goes out and never returns to "none";
/// after that it only moves to a different verdict.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementState {
    last: Option<DirectionVerdict>,
}

impl AnnouncementState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<DirectionVerdict> {
        self.last
    }
}

/// Speaks a directional advisory only when the verdict changes.
///
/// At 10-30 frames per second the verdict is identical for long runs of
/// frames; without this gate every frame would produce speech.
#[derive(Debug, Default)]
pub struct DirectionAnnouncer {
    state: AnnouncementState,
}

impl DirectionAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe this frame's verdict. Returns the advisory to speak iff it
    /// differs from the last spoken one; the state is updated only when
    /// something is returned.
    pub fn observe(&mut self, verdict: DirectionVerdict) -> Option<&'static str> {
        if self.state.last == Some(verdict) {
            return None;
        }
        self.state.last = Some(verdict);
        Some(verdict.advisory())
    }

    pub fn last_spoken(&self) -> Option<DirectionVerdict> {
        self.state.last()
    }
}

/// Announces the set of detected labels.
///
/// The label set is deduplicated and sorted, so the phrase is insensitive
/// to detection order and duplicate instances. Ungated by default: every
/// frame with detections re-announces. With gating on, the phrase repeats
/// only when the set changes, and an empty frame resets the gate so
/// reappearing objects are announced again.
#[derive(Debug, Default)]
pub struct LabelAnnouncer {
    gated: bool,
    last_set: Option<BTreeSet<String>>,
}

impl LabelAnnouncer {
    pub fn new(gated: bool) -> Self {
        Self {
            gated,
            last_set: None,
        }
    }

    /// Observe this frame's detections. Returns the phrase to speak, or
    /// `None` when there is nothing (new) to say.
    pub fn observe(&mut self, detections: &[Detection]) -> Option<String> {
        let labels: BTreeSet<String> =
            detections.iter().map(|d| d.label.clone()).collect();

        if labels.is_empty() {
            if self.gated {
                self.last_set = None;
            }
            return None;
        }

        if self.gated {
            if self.last_set.as_ref() == Some(&labels) {
                return None;
            }
            self.last_set = Some(labels.clone());
        }

        let joined = labels.into_iter().collect::<Vec<_>>().join(", ");
        Some(format!("I see {} in front of you.", joined))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guidelight_core::types::BoundingBox;

    fn det(label: &str) -> Detection {
        Detection::new(0, label, 0.9, BoundingBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_direction_first_observation_speaks() {
        let mut announcer = DirectionAnnouncer::new();
        assert_eq!(
            announcer.observe(DirectionVerdict::Clear),
            Some("Path is clear. You can move forward.")
        );
    }

    #[test]
    fn test_direction_repeat_is_suppressed() {
        let mut announcer = DirectionAnnouncer::new();
        assert!(announcer.observe(DirectionVerdict::Clear).is_some());
        assert!(announcer.observe(DirectionVerdict::Clear).is_none());
        assert_eq!(announcer.last_spoken(), Some(DirectionVerdict::Clear));
    }

    #[test]
    fn test_label_phrase_is_sorted_and_deduped() {
        let mut announcer = LabelAnnouncer::new(false);
        let phrase = announcer
            .observe(&[det("person"), det("chair"), det("person")])
            .unwrap();
        assert_eq!(phrase, "I see chair, person in front of you.");
    }

    #[test]
    fn test_label_empty_frame_is_silent() {
        let mut announcer = LabelAnnouncer::new(false);
        assert!(announcer.observe(&[]).is_none());
    }
}
