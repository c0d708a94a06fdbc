//! Error types for guidelight-eye

use guidelight_core::Error as CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    /// The camera device could not be opened at all. Fatal before the
    /// loop ever runs.
    #[error("Camera device {0} unavailable")]
    DeviceUnavailable(u32),

    /// One frame read failed. Transient: logged and retried next cycle.
    #[error("Frame read failed: {0}")]
    ReadFailure(String),

    /// Too many consecutive read failures; the device is considered gone.
    #[error("Camera lost after {0} consecutive failed reads")]
    DeviceLost(u32),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl VisionError {
    /// Whether this error ends the live loop (as opposed to one cycle).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VisionError::DeviceUnavailable(_) | VisionError::DeviceLost(_)
        )
    }
}

impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}

impl From<VisionError> for CoreError {
    fn from(err: VisionError) -> Self {
        CoreError::Vision(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::DeviceUnavailable(0);
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(VisionError::DeviceUnavailable(0).is_fatal());
        assert!(VisionError::DeviceLost(30).is_fatal());
        assert!(!VisionError::ReadFailure("grab".to_string()).is_fatal());
        assert!(!VisionError::Detector("shape".to_string()).is_fatal());
    }

    #[test]
    fn test_vision_error_to_core_error() {
        let err = VisionError::ReadFailure("timeout".to_string());
        let core: CoreError = err.into();
        match core {
            CoreError::Vision(msg) => assert!(msg.contains("timeout")),
            _ => panic!("Expected Vision error"),
        }
    }
}
