//! USB webcam capture

use crate::config::VisionConfig;
use crate::error::VisionError;
use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{
    VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH,
};
use tracing::info;

/// Source of raw frames.
///
/// The live loop exclusively owns its source: nothing else may read from
/// or release the device while the loop runs.
pub trait FrameSource: Send {
    /// Open the device. Fails with `DeviceUnavailable` if it cannot be
    /// acquired; calling open on an already-open source is a no-op.
    fn open(&mut self) -> Result<(), VisionError>;

    /// Read one frame. Transient failures surface as `ReadFailure`.
    fn read_frame(&mut self) -> Result<Mat, VisionError>;

    /// Release the device. Idempotent.
    fn close(&mut self);
}

/// Camera-backed frame source over an OpenCV `VideoCapture`.
pub struct CameraSource {
    camera_id: u32,
    resolution: (u32, u32),
    frame_rate: u32,
    capture: Option<VideoCapture>,
}

impl CameraSource {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            camera_id: config.camera_id,
            resolution: config.resolution,
            frame_rate: config.frame_rate,
            capture: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }
}

impl FrameSource for CameraSource {
    fn open(&mut self) -> Result<(), VisionError> {
        if self.capture.is_some() {
            return Ok(());
        }

        let mut capture = VideoCapture::new(self.camera_id as i32, CAP_ANY)
            .map_err(|_| VisionError::DeviceUnavailable(self.camera_id))?;

        if !capture
            .is_opened()
            .map_err(|_| VisionError::DeviceUnavailable(self.camera_id))?
        {
            return Err(VisionError::DeviceUnavailable(self.camera_id));
        }

        capture.set(CAP_PROP_FRAME_WIDTH, self.resolution.0 as f64)?;
        capture.set(CAP_PROP_FRAME_HEIGHT, self.resolution.1 as f64)?;
        capture.set(CAP_PROP_FPS, self.frame_rate as f64)?;

        info!(
            "Camera {} opened at {}x{} @ {}fps",
            self.camera_id, self.resolution.0, self.resolution.1, self.frame_rate
        );
        self.capture = Some(capture);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Mat, VisionError> {
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| VisionError::ReadFailure("camera not open".to_string()))?;

        let mut frame = Mat::default();
        let grabbed = capture
            .read(&mut frame)
            .map_err(|e| VisionError::ReadFailure(e.message))?;

        if !grabbed || frame.empty() {
            return Err(VisionError::ReadFailure("no frame received".to_string()));
        }

        Ok(frame)
    }

    fn close(&mut self) {
        if self.capture.take().is_some() {
            info!("Camera {} released", self.camera_id);
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}
