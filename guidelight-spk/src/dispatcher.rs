//! Fire-and-forget speech dispatch
//!
//! Announcements are enqueued from the live loop without blocking it. A
//! single worker task drains a latest-value channel: if a new announcement
//! arrives while an utterance is being synthesized, it replaces whatever
//! was pending, so the worker always speaks the most recent verdict and
//! utterances are never interleaved.

use crate::synthesizer::SpeechSynthesizer;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Utterance {
    seq: u64,
    text: String,
}

struct HandleInner {
    tx: watch::Sender<Option<Utterance>>,
    seq: AtomicU64,
}

/// Cheap, cloneable handle for enqueueing announcements.
///
/// When every clone is dropped the worker finishes its in-flight utterance
/// and exits.
#[derive(Clone)]
pub struct SpeechHandle {
    inner: Arc<HandleInner>,
}

impl SpeechHandle {
    /// Enqueue an announcement, replacing any announcement still pending.
    /// Never blocks.
    pub fn enqueue(&self, text: impl Into<String>) {
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        let utterance = Utterance {
            seq,
            text: text.into(),
        };
        if self.inner.tx.send(Some(utterance)).is_err() {
            debug!("speech worker gone, dropping announcement");
        }
    }
}

/// Spawns the background speech worker.
pub struct SpeechDispatcher;

impl SpeechDispatcher {
    /// Spawn the worker and return a handle plus its join handle.
    pub fn spawn(synthesizer: Arc<SpeechSynthesizer>) -> (SpeechHandle, JoinHandle<()>) {
        let (tx, mut rx) = watch::channel::<Option<Utterance>>(None);

        let worker = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().clone();
                let Some(utterance) = latest else { continue };

                debug!(seq = utterance.seq, "dispatching utterance");
                // Speech is best-effort: a failed synthesis must never take
                // the worker (or the loop feeding it) down.
                if let Err(e) = synthesizer.speak(&utterance.text).await {
                    warn!("speech synthesis failed: {}", e);
                }
            }
            debug!("speech dispatcher drained");
        });

        let handle = SpeechHandle {
            inner: Arc::new(HandleInner {
                tx,
                seq: AtomicU64::new(0),
            }),
        };

        (handle, worker)
    }
}
