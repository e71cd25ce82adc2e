//! **Voice Input**: one listening session at a time over a `SpeechRecognizer`.
//!
//! State machine per session: `Idle → Listening → (Recognized | TimedOut | Error) → Idle`.
//! Each session emits exactly one `RecognitionEvent`. Starting while a session is live
//! hands back the live handle instead of starting a second recognition. Every clone sees
//! the event, but only one of them can `claim` the recognized utterance.

use crate::error::{VoiceError, VoiceResult};
use crate::recognizer::SpeechRecognizer;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Whether the adapter currently has a live listening session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListeningState {
    Idle,
    Listening,
}

/// Terminal event of one listening session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// One utterance was recognized. The only event that feeds the controller.
    Recognized(String),
    /// The listening timeout elapsed before anything was recognized.
    TimedOut,
    /// Recognition failed, heard nothing, or was cancelled.
    Error(String),
}

/// Configuration for the Voice Input adapter.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// Upper bound on a single listening session (default 10s).
    pub timeout: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// Handle to one listening session. Clones observe the same session.
#[derive(Debug, Clone)]
pub struct ListeningHandle {
    id: u64,
    cancel: CancellationToken,
    events: watch::Receiver<Option<RecognitionEvent>>,
    claimed: Arc<AtomicBool>,
}

impl ListeningHandle {
    /// Session id; equal ids mean the same recognition session.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// True until the session has produced its event.
    pub fn is_listening(&self) -> bool {
        self.events.borrow().is_none()
    }

    /// Stop the session. The pending event resolves to `RecognitionEvent::Error`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Take ownership of the session's utterance. Returns true for exactly one caller
    /// across all clones of this handle.
    pub fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    /// Wait for the session's single event.
    pub async fn wait(&mut self) -> RecognitionEvent {
        loop {
            let current = self.events.borrow_and_update().clone();
            if let Some(event) = current {
                return event;
            }
            if self.events.changed().await.is_err() {
                let last = self.events.borrow().clone();
                return last
                    .unwrap_or_else(|| RecognitionEvent::Error("listener dropped".to_string()));
            }
        }
    }
}

/// The Voice Input adapter: capability detection plus single-flight listening sessions.
pub struct VoiceInput {
    recognizer: Arc<dyn SpeechRecognizer>,
    config: ListenConfig,
    current: Mutex<Option<ListeningHandle>>,
    next_id: AtomicU64,
}

impl VoiceInput {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, config: ListenConfig) -> Self {
        Self {
            recognizer,
            config,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Whether the wrapped recognizer is available.
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_supported()
    }

    /// Start a listening session, or return the live one if a session is already running.
    pub async fn start_listening(&self) -> VoiceResult<ListeningHandle> {
        if !self.is_supported() {
            return Err(VoiceError::RecognitionUnsupported);
        }

        let mut current = self.current.lock().await;
        if let Some(handle) = current.as_ref().filter(|h| h.is_listening()) {
            debug!(target: "icon::voice", session = handle.id, "already listening; reusing handle");
            return Ok(handle.clone());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let (event_tx, event_rx) = watch::channel(None);

        let recognizer = Arc::clone(&self.recognizer);
        let task_cancel = cancel.clone();
        let timeout = self.config.timeout;
        info!(target: "icon::voice", session = id, ?timeout, "listening");

        tokio::spawn(async move {
            let event = tokio::select! {
                _ = task_cancel.cancelled() => RecognitionEvent::Error(VoiceError::Cancelled.to_string()),
                result = tokio::time::timeout(timeout, recognizer.recognize()) => match result {
                    Ok(Ok(Some(text))) => RecognitionEvent::Recognized(text),
                    Ok(Ok(None)) => RecognitionEvent::Error("no speech detected".to_string()),
                    Ok(Err(e)) => RecognitionEvent::Error(e.to_string()),
                    Err(_) => RecognitionEvent::TimedOut,
                },
            };
            debug!(target: "icon::voice", session = id, ?event, "listening ended");
            event_tx.send_replace(Some(event));
        });

        let handle = ListeningHandle {
            id,
            cancel,
            events: event_rx,
            claimed: Arc::new(AtomicBool::new(false)),
        };
        *current = Some(handle.clone());
        Ok(handle)
    }

    /// Current adapter state.
    pub async fn state(&self) -> ListeningState {
        match self.current.lock().await.as_ref() {
            Some(h) if h.is_listening() => ListeningState::Listening,
            _ => ListeningState::Idle,
        }
    }

    /// Cancel the live session, if any.
    pub async fn cancel(&self) {
        if let Some(handle) = self.current.lock().await.take() {
            if handle.is_listening() {
                info!(target: "icon::voice", session = handle.id, "listening cancelled");
            }
            handle.cancel();
        }
    }
}
