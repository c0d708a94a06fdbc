//! Spatial reasoning: detections → directional advisory
//!
//! Obstacles in the left half of the frame mean the clear space is on the
//! right, so the advisory tells the user to move right, and vice versa.
//! Only the left/right counts matter, never the order of detections.

use guidelight_core::types::{Detection, DirectionVerdict};

/// Classify one frame's obstacle layout into a directional verdict.
///
/// Each detection is bucketed by its horizontal center against the frame
/// midline; a center exactly on the midline counts as right-half. Pure and
/// stable under reordering of the detections.
pub fn suggest_direction(detections: &[Detection], frame_width: f32) -> DirectionVerdict {
    let midline = frame_width / 2.0;

    let mut left_count = 0usize;
    let mut right_count = 0usize;
    for detection in detections {
        if detection.bbox.center_x() < midline {
            left_count += 1;
        } else {
            right_count += 1;
        }
    }

    if left_count == 0 && right_count == 0 {
        DirectionVerdict::Clear
    } else if left_count > right_count {
        DirectionVerdict::ObstacleLeft
    } else if right_count > left_count {
        DirectionVerdict::ObstacleRight
    } else {
        DirectionVerdict::ObstacleBoth
    }
}
