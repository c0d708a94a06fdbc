//! Log-only TTS engine
//!
//! Stands in for a real engine when speech is switched off or the host has
//! no audio stack (CI, headless boxes). Utterances are logged, never spoken.

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Default)]
pub struct NullEngine;

impl NullEngine {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TtsEngine for NullEngine {
    async fn speak(&self, text: &str) -> Result<Option<PathBuf>, SpeechError> {
        info!(utterance = %text, "speech suppressed (null engine)");
        Ok(None)
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "null"
    }
}
