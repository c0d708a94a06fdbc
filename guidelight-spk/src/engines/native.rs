//! Native platform TTS engine
//!
//! One engine per platform, chosen at compile time: espeak-ng on Linux,
//! `say` on macOS, SAPI (via PowerShell System.Speech) on Windows. The
//! engine speaks directly to the default audio device; with `save_audio`
//! it synthesizes to a WAV/AIFF artifact first and plays that, returning
//! the artifact path.

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// Native TTS engine (platform-specific)
pub struct NativeTtsEngine {
    rate: u32,
    volume: f32,
    artifact_dir: Option<PathBuf>,
    available: bool,
}

impl NativeTtsEngine {
    /// Probe the platform's TTS stack and build an engine.
    ///
    /// `artifact_dir` turns on save-audio mode: every utterance is written
    /// there under a unique file name before playback.
    pub fn new(rate: u32, volume: f32, artifact_dir: Option<PathBuf>) -> Result<Self, SpeechError> {
        if let Some(dir) = &artifact_dir {
            std::fs::create_dir_all(dir)?;
        }

        let available = platform::probe();
        if available {
            info!(backend = platform::BACKEND, "native TTS engine initialized");
        } else {
            warn!(backend = platform::BACKEND, "native TTS backend not found");
        }

        Ok(Self {
            rate,
            volume,
            artifact_dir,
            available,
        })
    }

    fn artifact_path(&self) -> Option<PathBuf> {
        self.artifact_dir.as_ref().map(|dir| {
            dir.join(format!(
                "utterance-{}.{}",
                uuid::Uuid::new_v4(),
                platform::ARTIFACT_EXT
            ))
        })
    }

    /// Strip control characters before handing text to an external process.
    fn sanitize(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n')
            .take(10_000)
            .collect()
    }
}

#[async_trait]
impl TtsEngine for NativeTtsEngine {
    async fn speak(&self, text: &str) -> Result<Option<PathBuf>, SpeechError> {
        if !self.available {
            return Err(SpeechError::Engine(format!(
                "{} not available on this host",
                platform::BACKEND
            )));
        }

        let sanitized = Self::sanitize(text);
        if sanitized.is_empty() {
            return Err(SpeechError::Synthesizer(
                "Text is empty after sanitization".to_string(),
            ));
        }

        let artifact = self.artifact_path();
        platform::speak(&sanitized, self.rate, self.volume, artifact).await
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        "native"
    }
}

#[cfg(target_os = "linux")]
mod platform {
    use super::*;
    use tokio::process::Command;

    pub const BACKEND: &str = "espeak-ng";
    pub const ARTIFACT_EXT: &str = "wav";

    pub fn probe() -> bool {
        std::process::Command::new("espeak-ng")
            .arg("--version")
            .output()
            .is_ok()
    }

    pub async fn speak(
        text: &str,
        rate: u32,
        volume: f32,
        artifact: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, SpeechError> {
        // espeak-ng amplitude is 0-200, 100 being normal.
        let amplitude = ((volume * 200.0).round() as u32).min(200);

        let mut cmd = Command::new("espeak-ng");
        cmd.arg("-s").arg(rate.to_string());
        cmd.arg("-a").arg(amplitude.to_string());
        if let Some(path) = &artifact {
            cmd.arg("-w").arg(path);
        }
        cmd.arg(text);

        let output = cmd
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to run espeak-ng: {}", e)))?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "espeak-ng failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        if let Some(path) = artifact {
            // -w wrote the file instead of playing; play it back now.
            // Playback failure leaves the artifact usable, so log and go on.
            match Command::new("aplay").arg(&path).output().await {
                Ok(play) if play.status.success() => {}
                Ok(play) => warn!(
                    "aplay exited with {}: {}",
                    play.status,
                    String::from_utf8_lossy(&play.stderr)
                ),
                Err(e) => warn!("Failed to run aplay: {}", e),
            }
            return Ok(Some(path));
        }

        Ok(None)
    }
}

#[cfg(target_os = "macos")]
mod platform {
    use super::*;
    use tokio::process::Command;

    pub const BACKEND: &str = "say";
    pub const ARTIFACT_EXT: &str = "aiff";

    pub fn probe() -> bool {
        std::process::Command::new("say").arg("-v").arg("?").output().is_ok()
    }

    pub async fn speak(
        text: &str,
        rate: u32,
        _volume: f32,
        artifact: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, SpeechError> {
        let mut cmd = Command::new("say");
        cmd.arg("-r").arg(rate.min(500).to_string());
        if let Some(path) = &artifact {
            cmd.arg("-o").arg(path);
        }
        cmd.arg(text);

        let output = cmd
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to run say: {}", e)))?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "say failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        if let Some(path) = artifact {
            match Command::new("afplay").arg(&path).output().await {
                Ok(play) if play.status.success() => {}
                Ok(play) => warn!("afplay exited with {}", play.status),
                Err(e) => warn!("Failed to run afplay: {}", e),
            }
            return Ok(Some(path));
        }

        Ok(None)
    }
}

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use tokio::process::Command;

    pub const BACKEND: &str = "sapi";
    pub const ARTIFACT_EXT: &str = "wav";

    pub fn probe() -> bool {
        // System.Speech ships with every supported Windows.
        true
    }

    pub async fn speak(
        text: &str,
        rate: u32,
        volume: f32,
        artifact: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, SpeechError> {
        // SpeechSynthesizer.Rate is -10..10; map from words per minute with
        // 250 wpm as the neutral midpoint.
        let sapi_rate = (((rate as i32) - 250) * 10 / 250).clamp(-10, 10);
        let sapi_volume = ((volume * 100.0).round() as u32).min(100);

        // Single-quote PowerShell strings; the only escape needed is ''.
        let escaped_text = text.replace('\'', "''");

        let output_stmt = match &artifact {
            Some(path) => format!(
                "$synth.SetOutputToWaveFile('{}')",
                path.to_string_lossy().replace('\'', "''")
            ),
            None => "$synth.SetOutputToDefaultAudioDevice()".to_string(),
        };
        let playback_stmt = match &artifact {
            Some(path) => format!(
                "(New-Object Media.SoundPlayer '{}').PlaySync()",
                path.to_string_lossy().replace('\'', "''")
            ),
            None => String::new(),
        };

        let script = format!(
            "Add-Type -AssemblyName System.Speech; \
             $synth = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $synth.Rate = {}; \
             $synth.Volume = {}; \
             {}; \
             $synth.Speak('{}'); \
             $synth.Dispose(); \
             {}",
            sapi_rate, sapi_volume, output_stmt, escaped_text, playback_stmt
        );

        let output = Command::new("powershell")
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(&script)
            .output()
            .await
            .map_err(|e| SpeechError::Engine(format!("Failed to execute PowerShell: {}", e)))?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "SAPI synthesis failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Ok(artifact)
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
mod platform {
    use super::*;

    pub const BACKEND: &str = "none";
    pub const ARTIFACT_EXT: &str = "wav";

    pub fn probe() -> bool {
        false
    }

    pub async fn speak(
        _text: &str,
        _rate: u32,
        _volume: f32,
        _artifact: Option<PathBuf>,
    ) -> Result<Option<PathBuf>, SpeechError> {
        Err(SpeechError::Engine(
            "Native TTS not supported on this platform".to_string(),
        ))
    }
}
