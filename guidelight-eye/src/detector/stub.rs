//! `StubDetector`: fixed-answer detector without real inference.
//!
//! Lets the loop, announcers and display be exercised end-to-end on hosts
//! without a model file. Returns the same detection set for every frame.

use crate::detector::ObjectDetector;
use crate::error::VisionError;
use guidelight_core::types::Detection;
use opencv::core::Mat;
use tracing::debug;

pub struct StubDetector {
    detections: Vec<Detection>,
}

impl StubDetector {
    /// A stub that sees nothing.
    pub fn empty() -> Self {
        Self { detections: vec![] }
    }

    /// A stub that reports the given detections for every frame.
    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl ObjectDetector for StubDetector {
    fn detect(&self, _frame: &Mat) -> Result<Vec<Detection>, VisionError> {
        debug!(count = self.detections.len(), "stub detector answering");
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}
