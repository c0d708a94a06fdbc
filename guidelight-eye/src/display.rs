//! Display sinks for annotated frames

use crate::error::VisionError;
use guidelight_core::StopSignal;
use opencv::core::Mat;
use opencv::highgui;
use tracing::info;

/// Write-only sink for annotated frames.
pub trait FrameSink: Send {
    fn emit(&mut self, frame: &Mat) -> Result<(), VisionError>;
}

/// On-screen window sink backed by OpenCV highgui.
///
/// Polls the keyboard while the window is up; `q` triggers the shared stop
/// signal, matching the assistant's quit key.
pub struct WindowSink {
    window_name: String,
    stop: StopSignal,
    created: bool,
}

impl WindowSink {
    pub fn new(window_name: impl Into<String>, stop: StopSignal) -> Self {
        Self {
            window_name: window_name.into(),
            stop,
            created: false,
        }
    }
}

impl FrameSink for WindowSink {
    fn emit(&mut self, frame: &Mat) -> Result<(), VisionError> {
        if !self.created {
            highgui::named_window(&self.window_name, highgui::WINDOW_AUTOSIZE)?;
            self.created = true;
        }

        highgui::imshow(&self.window_name, frame)?;

        let key = highgui::wait_key(1)?;
        if key == i32::from(b'q') {
            info!("'q' pressed, stopping live detection");
            self.stop.trigger();
        }

        Ok(())
    }
}

impl Drop for WindowSink {
    fn drop(&mut self) {
        if self.created {
            let _ = highgui::destroy_window(&self.window_name);
        }
    }
}

/// Sink that discards frames; for headless runs and tests.
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames emitted so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameSink for NullSink {
    fn emit(&mut self, _frame: &Mat) -> Result<(), VisionError> {
        self.frames += 1;
        Ok(())
    }
}
