//! Configuration for guidelight-eye

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Vision system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// USB camera device index (0, 1, 2, ...)
    pub camera_id: u32,
    /// Requested capture resolution (width, height)
    pub resolution: (u32, u32),
    /// Target frame rate (frames per second)
    pub frame_rate: u32,
    /// Every frame is resized to this resolution before detection and
    /// display
    pub working_resolution: (u32, u32),
    /// Path to the YOLO ONNX model file
    pub model_path: PathBuf,
    /// Minimum confidence for a detection to count
    pub confidence_threshold: f32,
    /// IoU threshold for non-maximum suppression
    pub nms_threshold: f32,
    /// Consecutive failed frame reads tolerated before the device is
    /// declared lost
    pub max_read_failures: u32,
    /// Announce the set of detected labels in addition to the direction
    pub announce_labels: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        let model_path = dirs::home_dir()
            .map(|mut p| {
                p.push(".guidelight");
                p.push("models");
                p.push("yolov8n.onnx");
                p
            })
            .unwrap_or_else(|| PathBuf::from("./models/yolov8n.onnx"));

        Self {
            camera_id: 0,
            resolution: (1280, 720),
            frame_rate: 30,
            working_resolution: (640, 480),
            model_path,
            confidence_threshold: 0.5,
            nms_threshold: 0.45,
            max_read_failures: 30,
            announce_labels: true,
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err("Frame rate must be between 1 and 120".to_string());
        }

        for (w, h) in [self.resolution, self.working_resolution] {
            if w == 0 || h == 0 {
                return Err("Resolution must be non-zero".to_string());
            }
            if w > 7680 || h > 4320 {
                return Err("Resolution too large (max 8K)".to_string());
            }
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("Confidence threshold must be between 0.0 and 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.nms_threshold) {
            return Err("NMS threshold must be between 0.0 and 1.0".to_string());
        }

        if self.max_read_failures == 0 {
            return Err("max_read_failures must be at least 1".to_string());
        }

        if self.camera_id > 100 {
            return Err("Camera ID too large (max 100)".to_string());
        }

        Ok(())
    }
}
