//! End-to-end tests for the live loop against scripted collaborators.
//!
//! No camera, no model, no audio device: the frame source, detector, sink
//! and TTS engine are all test doubles, which is exactly what the trait
//! seams are for.

use async_trait::async_trait;
use guidelight_core::types::{BoundingBox, Detection};
use guidelight_core::StopSignal;
use guidelight_eye::camera::FrameSource;
use guidelight_eye::config::VisionConfig;
use guidelight_eye::detector::{ObjectDetector, StubDetector};
use guidelight_eye::display::FrameSink;
use guidelight_eye::error::VisionError;
use guidelight_eye::live::{LiveLoop, LoopState, SpeechOutputs};
use guidelight_spk::config::{EngineKind, SpeechConfig};
use guidelight_spk::dispatcher::SpeechDispatcher;
use guidelight_spk::engines::TtsEngine;
use guidelight_spk::error::SpeechError;
use guidelight_spk::synthesizer::SpeechSynthesizer;
use opencv::core::{Mat, Scalar, CV_8UC3};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;

fn test_frame() -> Mat {
    Mat::new_rows_cols_with_default(240, 320, CV_8UC3, Scalar::all(0.0)).unwrap()
}

fn test_config() -> VisionConfig {
    let mut config = VisionConfig::default();
    config.working_resolution = (640, 480);
    config
}

/// Frame source scripted per test: open failure, permanent read failure,
/// or N good frames followed by a stop trigger.
struct ScriptedSource {
    fail_open: bool,
    fail_reads: bool,
    stop_after_reads: Option<u32>,
    stop: StopSignal,
    reads: Arc<AtomicU32>,
    closed: Arc<AtomicBool>,
}

impl ScriptedSource {
    fn healthy(stop_after_reads: u32, stop: StopSignal) -> Self {
        Self {
            fail_open: false,
            fail_reads: false,
            stop_after_reads: Some(stop_after_reads),
            stop,
            reads: Arc::new(AtomicU32::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn failing_reads(stop: StopSignal) -> Self {
        Self {
            fail_open: false,
            fail_reads: true,
            stop_after_reads: None,
            stop,
            reads: Arc::new(AtomicU32::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn unopenable(stop: StopSignal) -> Self {
        Self {
            fail_open: true,
            fail_reads: false,
            stop_after_reads: None,
            stop,
            reads: Arc::new(AtomicU32::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    fn reads_counter(&self) -> Arc<AtomicU32> {
        self.reads.clone()
    }

    fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }
}

impl FrameSource for ScriptedSource {
    fn open(&mut self) -> Result<(), VisionError> {
        if self.fail_open {
            return Err(VisionError::DeviceUnavailable(0));
        }
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Mat, VisionError> {
        let reads = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_reads {
            return Err(VisionError::ReadFailure("scripted failure".to_string()));
        }
        if let Some(limit) = self.stop_after_reads {
            if reads >= limit {
                self.stop.trigger();
            }
        }
        Ok(test_frame())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Sink that counts emitted frames.
struct CountingSink {
    frames: Arc<AtomicU64>,
}

impl FrameSink for CountingSink {
    fn emit(&mut self, _frame: &Mat) -> Result<(), VisionError> {
        self.frames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Detector whose answer changes after a given call count.
struct PhasedDetector {
    calls: AtomicU32,
    switch_at: u32,
    late: Vec<Detection>,
}

impl ObjectDetector for PhasedDetector {
    fn detect(&self, _frame: &Mat) -> Result<Vec<Detection>, VisionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.switch_at {
            Ok(self.late.clone())
        } else {
            Ok(vec![])
        }
    }

    fn name(&self) -> &str {
        "phased"
    }
}

/// Detector that always errors.
struct BrokenDetector;

impl ObjectDetector for BrokenDetector {
    fn detect(&self, _frame: &Mat) -> Result<Vec<Detection>, VisionError> {
        Err(VisionError::Detector("inference exploded".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Engine recording spoken utterances.
struct RecordingEngine {
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl TtsEngine for RecordingEngine {
    async fn speak(&self, text: &str) -> Result<Option<PathBuf>, SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(None)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Two dispatchers over one recording synthesizer, as the CLI wires them.
fn speech_rig() -> (SpeechOutputs, Arc<Mutex<Vec<String>>>, Vec<JoinHandle<()>>) {
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let mut speech_config = SpeechConfig::default();
    speech_config.engine = EngineKind::Null;
    let synth = Arc::new(SpeechSynthesizer::with_engine(
        speech_config,
        Arc::new(RecordingEngine {
            spoken: spoken.clone(),
        }),
    ));

    let (directions, dir_worker) = SpeechDispatcher::spawn(synth.clone());
    let (labels, label_worker) = SpeechDispatcher::spawn(synth);

    (
        SpeechOutputs { directions, labels },
        spoken,
        vec![dir_worker, label_worker],
    )
}

async fn drain_workers(workers: Vec<JoinHandle<()>>) {
    for worker in workers {
        timeout(Duration::from_secs(5), worker)
            .await
            .expect("speech worker did not drain")
            .unwrap();
    }
}

#[tokio::test]
async fn test_open_failure_aborts_before_running() {
    let stop = StopSignal::new();
    let source = ScriptedSource::unopenable(stop.clone());
    let frames = Arc::new(AtomicU64::new(0));
    let (outputs, _spoken, _workers) = speech_rig();

    let mut live = LiveLoop::new(
        test_config(),
        Box::new(source),
        Arc::new(StubDetector::empty()),
        Box::new(CountingSink {
            frames: frames.clone(),
        }),
        outputs,
        false,
        stop,
    )
    .unwrap();

    match live.run().await {
        Err(VisionError::DeviceUnavailable(0)) => {}
        other => panic!("Expected DeviceUnavailable, got {other:?}"),
    }
    assert_eq!(live.state(), LoopState::Stopped);
    assert_eq!(frames.load(Ordering::SeqCst), 0);
    assert_eq!(live.cycles(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_read_failures_do_not_crash_and_stop_is_honored() {
    let stop = StopSignal::new();
    let mut config = test_config();
    // Retry forever; only the stop signal can end this loop.
    config.max_read_failures = u32::MAX;

    let source = ScriptedSource::failing_reads(stop.clone());
    let reads = source.reads_counter();
    let closed = source.closed_flag();
    let (outputs, _spoken, _workers) = speech_rig();

    let mut live = LiveLoop::new(
        config,
        Box::new(source),
        Arc::new(StubDetector::empty()),
        Box::new(CountingSink {
            frames: Arc::new(AtomicU64::new(0)),
        }),
        outputs,
        false,
        stop.clone(),
    )
    .unwrap();

    let runner = tokio::spawn(async move { live.run().await });

    // Let it spin on failures for a while, then cancel.
    tokio::time::sleep(Duration::from_millis(50)).await;
    stop.trigger();

    let outcome = timeout(Duration::from_secs(5), runner)
        .await
        .expect("loop ignored the stop signal")
        .unwrap();
    assert!(outcome.is_ok());
    assert!(reads.load(Ordering::SeqCst) > 0);
    assert!(closed.load(Ordering::SeqCst), "camera must be released");
}

#[tokio::test]
async fn test_bounded_read_failures_surface_device_lost() {
    let stop = StopSignal::new();
    let mut config = test_config();
    config.max_read_failures = 5;

    let source = ScriptedSource::failing_reads(stop.clone());
    let reads = source.reads_counter();
    let closed = source.closed_flag();
    let (outputs, _spoken, _workers) = speech_rig();

    let mut live = LiveLoop::new(
        config,
        Box::new(source),
        Arc::new(StubDetector::empty()),
        Box::new(CountingSink {
            frames: Arc::new(AtomicU64::new(0)),
        }),
        outputs,
        false,
        stop,
    )
    .unwrap();

    match live.run().await {
        Err(VisionError::DeviceLost(5)) => {}
        other => panic!("Expected DeviceLost(5), got {other:?}"),
    }
    assert_eq!(reads.load(Ordering::SeqCst), 5);
    assert_eq!(live.state(), LoopState::Stopped);
    assert!(closed.load(Ordering::SeqCst), "camera must be released");
}

#[tokio::test]
async fn test_normal_run_emits_frames_and_announces_clear() {
    let stop = StopSignal::new();
    let source = ScriptedSource::healthy(5, stop.clone());
    let closed = source.closed_flag();
    let frames = Arc::new(AtomicU64::new(0));
    let (outputs, spoken, workers) = speech_rig();

    let mut live = LiveLoop::new(
        test_config(),
        Box::new(source),
        Arc::new(StubDetector::empty()),
        Box::new(CountingSink {
            frames: frames.clone(),
        }),
        outputs,
        false,
        stop,
    )
    .unwrap();

    live.run().await.unwrap();

    assert_eq!(live.state(), LoopState::Stopped);
    assert_eq!(live.cycles(), 5);
    assert_eq!(frames.load(Ordering::SeqCst), 5);
    assert!(closed.load(Ordering::SeqCst));

    // The loop owns the speech handles; dropping it drains the workers.
    drop(live);
    drain_workers(workers).await;

    // The verdict never changed, so exactly one advisory went out.
    assert_eq!(
        *spoken.lock().unwrap(),
        vec!["Path is clear. You can move forward."]
    );
}

#[tokio::test]
async fn test_detector_failure_skips_frame_but_loop_survives() {
    let stop = StopSignal::new();
    let source = ScriptedSource::healthy(3, stop.clone());
    let closed = source.closed_flag();
    let frames = Arc::new(AtomicU64::new(0));
    let (outputs, spoken, workers) = speech_rig();

    let mut live = LiveLoop::new(
        test_config(),
        Box::new(source),
        Arc::new(BrokenDetector),
        Box::new(CountingSink {
            frames: frames.clone(),
        }),
        outputs,
        false,
        stop,
    )
    .unwrap();

    live.run().await.unwrap();

    // Every cycle failed at the detector: nothing emitted, nothing spoken,
    // but the loop finished cleanly and released the camera.
    assert_eq!(live.cycles(), 3);
    assert_eq!(frames.load(Ordering::SeqCst), 0);
    assert!(closed.load(Ordering::SeqCst));

    drop(live);
    drain_workers(workers).await;
    assert!(spoken.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_verdict_change_is_announced() {
    let stop = StopSignal::new();
    let source = ScriptedSource::healthy(6, stop.clone());
    let (outputs, spoken, workers) = speech_rig();

    // Frames 1-2 see nothing; from frame 3 a person stands in the left half.
    let person_left = Detection::new(
        0,
        "person",
        0.9,
        BoundingBox::new(60.0, 100.0, 140.0, 300.0),
    );
    let detector = PhasedDetector {
        calls: AtomicU32::new(0),
        switch_at: 3,
        late: vec![person_left],
    };

    let mut live = LiveLoop::new(
        test_config(),
        Box::new(source),
        Arc::new(detector),
        Box::new(CountingSink {
            frames: Arc::new(AtomicU64::new(0)),
        }),
        outputs,
        false,
        stop,
    )
    .unwrap();

    live.run().await.unwrap();
    drop(live);
    drain_workers(workers).await;

    // Each stream coalesces to its newest value, so the final direction
    // advisory and the label phrase are both guaranteed through.
    let spoken = spoken.lock().unwrap().clone();
    assert!(spoken
        .iter()
        .any(|s| s == "Obstacle on left. Move slightly right."));
    assert!(spoken.iter().any(|s| s == "I see person in front of you."));
}

#[tokio::test]
async fn test_invalid_config_rejected_at_construction() {
    let stop = StopSignal::new();
    let mut config = test_config();
    config.frame_rate = 0;
    let (outputs, _spoken, _workers) = speech_rig();

    let result = LiveLoop::new(
        config,
        Box::new(ScriptedSource::healthy(1, stop.clone())),
        Arc::new(StubDetector::empty()),
        Box::new(CountingSink {
            frames: Arc::new(AtomicU64::new(0)),
        }),
        outputs,
        false,
        stop,
    );

    match result {
        Err(VisionError::Config(_)) => {}
        _ => panic!("Expected Config error"),
    }
}
