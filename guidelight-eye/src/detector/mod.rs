//! Object detection boundary

pub mod stub;
pub mod yolo;

use crate::error::VisionError;
use guidelight_core::types::Detection;
use opencv::core::Mat;

pub use stub::StubDetector;
pub use yolo::{YoloDetector, COCO_CLASSES};

/// Trait for object detectors.
///
/// `detect` is treated as a pure, possibly slow call: no retry logic lives
/// here, the live loop applies its own per-cycle failure policy.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in a frame. Bounding boxes are in the frame's own
    /// pixel coordinates.
    fn detect(&self, frame: &Mat) -> Result<Vec<Detection>, VisionError>;

    /// Get detector name
    fn name(&self) -> &str;
}
