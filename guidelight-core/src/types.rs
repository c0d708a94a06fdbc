//! Detection and advisory types shared across the workspace

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame-pixel coordinates, corner form.
///
/// `x1 <= x2` and `y1 <= y2` are expected but not enforced: detectors may
/// emit boxes slightly outside the frame near the edges, and downstream
/// consumers must tolerate that.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal center of the box, used to bucket obstacles left/right.
    pub fn center_x(&self) -> f32 {
        (self.x1 + self.x2) / 2.0
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        (self.width().max(0.0)) * (self.height().max(0.0))
    }

    /// Intersection-over-union with another box. Returns 0.0 for degenerate
    /// or non-overlapping pairs.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        if ix2 <= ix1 || iy2 <= iy1 {
            return 0.0;
        }

        let inter = (ix2 - ix1) * (iy2 - iy1);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 || !union.is_finite() {
            return 0.0;
        }

        let iou = inter / union;
        if iou.is_finite() {
            iou.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// One recognized object instance: label, confidence, bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: usize, label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            label: label.into(),
            confidence,
            bbox,
        }
    }
}

/// Directional advisory computed from one frame's detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionVerdict {
    /// No obstacles on either side.
    Clear,
    /// More obstacles in the left half: the user should move right.
    ObstacleLeft,
    /// More obstacles in the right half: the user should move left.
    ObstacleRight,
    /// Obstacles balanced on both sides.
    ObstacleBoth,
}

impl DirectionVerdict {
    /// Spoken advisory for this verdict.
    pub fn advisory(&self) -> &'static str {
        match self {
            DirectionVerdict::Clear => "Path is clear. You can move forward.",
            DirectionVerdict::ObstacleLeft => "Obstacle on left. Move slightly right.",
            DirectionVerdict::ObstacleRight => "Obstacle on right. Move slightly left.",
            DirectionVerdict::ObstacleBoth => "Objects on both sides. Proceed cautiously.",
        }
    }
}

impl std::fmt::Display for DirectionVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.advisory())
    }
}
