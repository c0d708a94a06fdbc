//! TTS engine implementations

pub mod native;
pub mod null;

use crate::error::SpeechError;
use async_trait::async_trait;
use std::path::PathBuf;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync {
    /// Speak text aloud. Returns the path of the saved audio artifact when
    /// the engine was configured to keep one, `None` otherwise.
    async fn speak(&self, text: &str) -> Result<Option<PathBuf>, SpeechError>;

    /// Check if engine is available on this host
    fn is_available(&self) -> bool;

    /// Get engine name
    fn name(&self) -> &str;
}
