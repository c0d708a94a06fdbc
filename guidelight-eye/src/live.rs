//! The live guidance loop
//!
//! One logical task drives every cycle: acquire a frame, detect objects,
//! reduce them to a directional advisory, hand announcements to the speech
//! dispatcher, annotate and emit the frame. Detection dominates cycle cost,
//! so the cycle is treated as atomic and cancellation is checked once per
//! cycle. The camera handle is owned here and released through a single
//! exit path no matter how the loop ends.

use crate::annotate::FrameAnnotator;
use crate::camera::FrameSource;
use crate::config::VisionConfig;
use crate::detector::ObjectDetector;
use crate::display::FrameSink;
use crate::error::VisionError;
use crate::reasoner::suggest_direction;
use guidelight_core::StopSignal;
use guidelight_spk::announcer::{DirectionAnnouncer, LabelAnnouncer};
use guidelight_spk::dispatcher::SpeechHandle;
use opencv::core::{Mat, Size};
use opencv::imgproc;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Running,
    Draining,
    Stopped,
}

/// Speech handles for the two announcement streams.
///
/// Direction advisories and label announcements each get their own
/// coalescing channel; sharing one synthesizer underneath keeps at most
/// one utterance in flight overall.
pub struct SpeechOutputs {
    pub directions: SpeechHandle,
    pub labels: SpeechHandle,
}

/// Orchestrates the acquire → detect → reason → announce → render cycle.
pub struct LiveLoop {
    config: VisionConfig,
    source: Box<dyn FrameSource>,
    detector: Arc<dyn ObjectDetector>,
    annotator: FrameAnnotator,
    sink: Box<dyn FrameSink>,
    direction_announcer: DirectionAnnouncer,
    label_announcer: LabelAnnouncer,
    speech: SpeechOutputs,
    stop: StopSignal,
    state: LoopState,
    cycles: u64,
}

impl LiveLoop {
    pub fn new(
        config: VisionConfig,
        source: Box<dyn FrameSource>,
        detector: Arc<dyn ObjectDetector>,
        sink: Box<dyn FrameSink>,
        speech: SpeechOutputs,
        gate_label_announcements: bool,
        stop: StopSignal,
    ) -> Result<Self, VisionError> {
        config.validate().map_err(VisionError::Config)?;

        Ok(Self {
            config,
            source,
            detector,
            annotator: FrameAnnotator::new(),
            sink,
            direction_announcer: DirectionAnnouncer::new(),
            label_announcer: LabelAnnouncer::new(gate_label_announcements),
            speech,
            stop,
            state: LoopState::Initializing,
            cycles: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Completed detection cycles (successful frame reads).
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Drive the loop until the stop signal fires or the device is lost.
    ///
    /// A failed open aborts before Running with `DeviceUnavailable`. After
    /// that, every exit goes through Draining, which releases the camera.
    pub async fn run(&mut self) -> Result<(), VisionError> {
        self.state = LoopState::Initializing;
        info!("Live loop initializing");

        if let Err(e) = self.source.open() {
            error!("Camera open failed: {}", e);
            self.state = LoopState::Stopped;
            return Err(e);
        }

        self.state = LoopState::Running;
        info!("Live loop running, detector={}", self.detector.name());

        let mut consecutive_read_failures: u32 = 0;
        let mut outcome = Ok(());

        loop {
            if self.stop.is_triggered() {
                info!("Stop requested, draining");
                break;
            }

            let frame = match self.source.read_frame() {
                Ok(frame) => {
                    consecutive_read_failures = 0;
                    frame
                }
                Err(e) => {
                    consecutive_read_failures += 1;
                    warn!(
                        failures = consecutive_read_failures,
                        "Frame not received, retrying: {}", e
                    );
                    if consecutive_read_failures >= self.config.max_read_failures {
                        error!(
                            "Camera lost after {} consecutive failed reads",
                            consecutive_read_failures
                        );
                        outcome = Err(VisionError::DeviceLost(consecutive_read_failures));
                        break;
                    }
                    tokio::task::yield_now().await;
                    continue;
                }
            };

            self.cycles += 1;
            if let Err(e) = self.process_frame(&frame) {
                // One bad cycle must not take the loop down; the frame is
                // dropped and the next read starts fresh.
                warn!("Cycle failed, skipping frame: {}", e);
            }

            tokio::task::yield_now().await;
        }

        self.state = LoopState::Draining;
        self.drain();
        outcome
    }

    fn process_frame(&mut self, frame: &Mat) -> Result<(), VisionError> {
        let (work_w, work_h) = self.config.working_resolution;

        let mut working = Mat::default();
        imgproc::resize(
            frame,
            &mut working,
            Size::new(work_w as i32, work_h as i32),
            0.0,
            0.0,
            imgproc::INTER_LINEAR,
        )?;

        let detections = self.detector.detect(&working)?;
        let verdict = suggest_direction(&detections, work_w as f32);

        if let Some(advisory) = self.direction_announcer.observe(verdict) {
            self.speech.directions.enqueue(advisory);
        }
        if self.config.announce_labels {
            if let Some(phrase) = self.label_announcer.observe(&detections) {
                self.speech.labels.enqueue(phrase);
            }
        }

        let annotated = self.annotator.render(&working, &detections, verdict.advisory())?;
        self.sink.emit(&annotated)
    }

    fn drain(&mut self) {
        info!("Live loop draining");
        self.source.close();
        self.state = LoopState::Stopped;
        info!(cycles = self.cycles, "Live loop stopped");
    }
}
