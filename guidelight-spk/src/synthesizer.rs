//! Speech synthesizer with single-utterance pooling

use crate::config::{EngineKind, SpeechConfig};
use crate::engines::native::NativeTtsEngine;
use crate::engines::null::NullEngine;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// Speech synthesizer wrapping one engine behind a one-permit semaphore.
///
/// The permit is acquired per utterance and released on every exit path,
/// so at most one utterance is ever in flight and the engine is never
/// re-entered.
pub struct SpeechSynthesizer {
    config: Arc<SpeechConfig>,
    engine: Arc<dyn TtsEngine>,
    in_flight: Arc<Semaphore>,
}

impl SpeechSynthesizer {
    /// Create a new speech synthesizer from config.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Config)?;

        if !config.enabled {
            return Err(SpeechError::Config(
                "Speech output is disabled".to_string(),
            ));
        }

        let engine: Arc<dyn TtsEngine> = match config.engine {
            EngineKind::Native => {
                let artifact_dir = config.save_audio.then(|| config.artifact_dir.clone());
                let native = NativeTtsEngine::new(config.rate, config.volume, artifact_dir)?;
                if !native.is_available() {
                    return Err(SpeechError::Engine(
                        "Native TTS engine not available".to_string(),
                    ));
                }
                Arc::new(native)
            }
            EngineKind::Null => Arc::new(NullEngine::new()),
        };

        Ok(Self::with_engine(config, engine))
    }

    /// Build a synthesizer around an already-constructed engine.
    pub fn with_engine(config: SpeechConfig, engine: Arc<dyn TtsEngine>) -> Self {
        Self {
            config: Arc::new(config),
            engine,
            in_flight: Arc::new(Semaphore::new(1)),
        }
    }

    /// Speak one utterance. Waits for any in-flight utterance to finish
    /// first; the permit is released even when the engine fails.
    pub async fn speak(&self, text: &str) -> Result<Option<PathBuf>, SpeechError> {
        if text.is_empty() {
            return Err(SpeechError::Synthesizer("Text cannot be empty".to_string()));
        }

        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|e| SpeechError::Synthesizer(format!("Failed to acquire permit: {}", e)))?;

        debug!(engine = self.engine.name(), "speaking utterance");
        self.engine.speak(text).await
    }

    /// Whether an utterance is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.in_flight.available_permits() == 0
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }
}
