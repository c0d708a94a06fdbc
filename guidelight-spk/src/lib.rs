//! guidelight-spk: speech output for the GuideLight assistant
//!
//! Provides text-to-speech with:
//! - Platform-native TTS engines behind one trait (Linux espeak-ng,
//!   macOS say, Windows SAPI), selected once at startup
//! - A synthesizer that keeps at most one utterance in flight
//! - A fire-and-forget dispatcher that coalesces queued announcements
//!   to the latest one
//! - Change-gated announcers that decide what is worth saying at all

pub mod announcer;
pub mod config;
pub mod dispatcher;
pub mod engines;
pub mod error;
pub mod synthesizer;

pub use announcer::{AnnouncementState, DirectionAnnouncer, LabelAnnouncer};
pub use config::{EngineKind, SpeechConfig};
pub use dispatcher::{SpeechDispatcher, SpeechHandle};
pub use engines::TtsEngine;
pub use error::SpeechError;
pub use synthesizer::SpeechSynthesizer;
