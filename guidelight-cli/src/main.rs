// GuideLight command line interface
// Wires the camera, detector, speech stack and live loop together.

use anyhow::Context;
use clap::Parser;
use guidelight_core::{banner, StopSignal};
use guidelight_eye::camera::CameraSource;
use guidelight_eye::config::VisionConfig;
use guidelight_eye::detector::{ObjectDetector, StubDetector, YoloDetector};
use guidelight_eye::display::{FrameSink, NullSink, WindowSink};
use guidelight_eye::live::{LiveLoop, SpeechOutputs};
use guidelight_spk::config::{EngineKind, SpeechConfig};
use guidelight_spk::dispatcher::SpeechDispatcher;
use guidelight_spk::synthesizer::SpeechSynthesizer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const WINDOW_TITLE: &str = "GuideLight — Live Detection";
const STARTUP_ANNOUNCEMENT: &str = "System initialized successfully. Live detection is ready.";

#[derive(Parser)]
#[command(name = "guidelight")]
#[command(about = "GuideLight — live obstacle guidance for the visually impaired", long_about = None)]
#[command(version)]
struct Cli {
    /// Camera device index
    #[arg(long, default_value = "0")]
    camera: u32,

    /// Path to the YOLO ONNX model
    #[arg(long)]
    model: Option<PathBuf>,

    /// Use the stub detector instead of the ONNX model
    #[arg(long)]
    stub_detector: bool,

    /// Run without a display window
    #[arg(long)]
    headless: bool,

    /// Disable speech output
    #[arg(long)]
    no_speech: bool,

    /// Keep synthesized audio artifacts on disk
    #[arg(long)]
    save_audio: bool,

    /// Announce detected labels only when the set changes
    #[arg(long)]
    gate_labels: bool,

    /// Announce only the direction, never the detected labels
    #[arg(long)]
    no_labels: bool,

    /// Log filter (e.g. "info" or "guidelight_eye=debug")
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("{}", banner::render());

    let mut vision_config = VisionConfig::default();
    vision_config.camera_id = cli.camera;
    if let Some(model) = cli.model {
        vision_config.model_path = model;
    }
    vision_config.announce_labels = !cli.no_labels;
    vision_config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid vision configuration")?;

    let mut speech_config = SpeechConfig::default();
    if cli.no_speech {
        speech_config.engine = EngineKind::Null;
    }
    speech_config.save_audio = cli.save_audio;
    speech_config.gate_label_announcements = cli.gate_labels;

    let detector: Arc<dyn ObjectDetector> = if cli.stub_detector {
        warn!("Using stub detector; no real detection will happen");
        Arc::new(StubDetector::empty())
    } else {
        Arc::new(
            YoloDetector::new(
                &vision_config.model_path,
                vision_config.confidence_threshold,
                vision_config.nms_threshold,
            )
            .context("failed to load detection model")?,
        )
    };

    let synthesizer = Arc::new(
        SpeechSynthesizer::new(speech_config.clone())
            .context("failed to initialize speech synthesizer")?,
    );
    info!("Speech engine: {}", synthesizer.engine_name());

    // One coalescing channel per announcement stream; the shared
    // synthesizer keeps at most one utterance in flight overall.
    let (directions, dir_worker) = SpeechDispatcher::spawn(synthesizer.clone());
    let (labels, label_worker) = SpeechDispatcher::spawn(synthesizer);

    directions.enqueue(STARTUP_ANNOUNCEMENT);

    let stop = StopSignal::new();
    {
        // Ctrl-C routes to the same cooperative stop signal as the
        // window's 'q' key.
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping");
                stop.trigger();
            }
        });
    }

    let sink: Box<dyn FrameSink> = if cli.headless {
        Box::new(NullSink::new())
    } else {
        Box::new(WindowSink::new(WINDOW_TITLE, stop.clone()))
    };

    let source = CameraSource::new(&vision_config);
    let gate_labels = speech_config.gate_label_announcements;

    let mut live = LiveLoop::new(
        vision_config,
        Box::new(source),
        detector,
        sink,
        SpeechOutputs { directions, labels },
        gate_labels,
        stop,
    )?;

    let outcome = live.run().await;

    // Dropping the loop releases its speech handles; give the dispatchers
    // a moment to finish any in-flight utterance.
    drop(live);
    for worker in [dir_worker, label_worker] {
        if tokio::time::timeout(Duration::from_secs(5), worker).await.is_err() {
            warn!("Speech worker did not drain in time");
        }
    }

    match outcome {
        Ok(()) => {
            info!("Detection stopped safely");
            Ok(())
        }
        Err(e) => {
            error!("Live detection stopped: {}", e);
            Err(e.into())
        }
    }
}
