//! Configuration for speech output

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// TTS engine selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineKind {
    /// Platform-native TTS (Linux espeak-ng, macOS say, Windows SAPI)
    Native,
    /// Log-only engine for headless runs and tests
    Null,
}

/// Speech output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Enable speech output
    pub enabled: bool,

    /// Which engine to use
    pub engine: EngineKind,

    /// Speech rate (words per minute, 1-500)
    pub rate: u32,

    /// Volume (0.0-1.0)
    pub volume: f32,

    /// Keep synthesized audio artifacts on disk
    pub save_audio: bool,

    /// Directory for saved audio artifacts
    pub artifact_dir: PathBuf,

    /// Change-gate the detected-labels announcement as well.
    ///
    /// Off by default: every frame with detections re-announces its label
    /// set. Turning this on suppresses repeats until the set changes.
    pub gate_label_announcements: bool,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let artifact_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("guidelight")
            .join("audio");

        Self {
            enabled: true,
            engine: EngineKind::Native,
            rate: 150,
            volume: 0.8,
            save_audio: false,
            artifact_dir,
            gate_label_announcements: false,
        }
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.rate == 0 || self.rate > 500 {
            return Err("Speech rate must be between 1 and 500 wpm".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) || !self.volume.is_finite() {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        Ok(())
    }
}
