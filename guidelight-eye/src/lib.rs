//! guidelight-eye: the vision side of the GuideLight assistant
//!
//! Owns the camera, runs object detection, reduces detections to a
//! directional advisory and drives the live guidance loop:
//!
//! acquire frame → detect → suggest direction → announce → annotate → emit

pub mod annotate;
pub mod camera;
pub mod config;
pub mod detector;
pub mod display;
pub mod error;
pub mod live;
pub mod reasoner;

pub use camera::{CameraSource, FrameSource};
pub use config::VisionConfig;
pub use detector::ObjectDetector;
pub use error::VisionError;
pub use live::{LiveLoop, LoopState};
pub use reasoner::suggest_direction;
