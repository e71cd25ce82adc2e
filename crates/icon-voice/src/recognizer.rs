//! **Speech recognition capability**: turns one block of user speech into text.
//!
//! Implement `SpeechRecognizer` for the platform recognizer (browser bridge, local Whisper,
//! a remote transcription API). The adapter in `listener` calls `recognize` once per
//! listening session and treats the result as the only utterance of that session.

use crate::error::{VoiceError, VoiceResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::{mpsc, Mutex};

/// Platform speech recognizer. Implementations must be cancel-safe: the listener drops the
/// `recognize` future when the surface closes or the listening timeout fires.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Whether recognition is available at all. Checked before every listening session.
    fn is_supported(&self) -> bool;

    /// Wait for one utterance. `Ok(None)` means the recognizer finished without hearing speech.
    async fn recognize(&self) -> VoiceResult<Option<String>>;
}

/// Recognizer for platforms without speech input. `is_supported` is always false.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRecognizer;

#[async_trait]
impl SpeechRecognizer for NoRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn recognize(&self) -> VoiceResult<Option<String>> {
        Err(VoiceError::RecognitionUnsupported)
    }
}

/// Scripted recognizer: pops one queued utterance per call. Use for demos and tests.
#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    utterances: Mutex<VecDeque<String>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_utterances<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            utterances: Mutex::new(utterances.into_iter().map(Into::into).collect()),
        }
    }

    /// Queue another utterance for a later listening session.
    pub async fn push(&self, utterance: impl Into<String>) {
        self.utterances.lock().await.push_back(utterance.into());
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn recognize(&self) -> VoiceResult<Option<String>> {
        Ok(self.utterances.lock().await.pop_front())
    }
}

/// Channel-backed recognizer: waits for text pushed through the paired sender.
///
/// Bridges a host that already produces transcripts (a terminal, a websocket, a browser
/// `SpeechRecognition` callback) into the listening state machine.
#[derive(Debug)]
pub struct ChannelRecognizer {
    rx: Mutex<mpsc::Receiver<String>>,
}

impl ChannelRecognizer {
    /// Create the recognizer and the sender that feeds it.
    pub fn new(buffer: usize) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self { rx: Mutex::new(rx) }, tx)
    }
}

#[async_trait]
impl SpeechRecognizer for ChannelRecognizer {
    fn is_supported(&self) -> bool {
        true
    }

    async fn recognize(&self) -> VoiceResult<Option<String>> {
        let mut rx = self.rx.lock().await;
        match rx.recv().await {
            Some(text) => {
                let text = text.trim().to_string();
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            None => Err(VoiceError::ChannelReceive(
                "transcript source closed".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_pops_in_order() {
        let rec = ScriptedRecognizer::with_utterances(["one", "two"]);
        assert_eq!(rec.recognize().await.unwrap().as_deref(), Some("one"));
        assert_eq!(rec.recognize().await.unwrap().as_deref(), Some("two"));
        assert_eq!(rec.recognize().await.unwrap(), None);
    }

    #[tokio::test]
    async fn no_recognizer_is_unsupported() {
        let rec = NoRecognizer;
        assert!(!rec.is_supported());
        assert_eq!(
            rec.recognize().await.unwrap_err(),
            VoiceError::RecognitionUnsupported
        );
    }

    #[tokio::test]
    async fn channel_trims_and_skips_blank() {
        let (rec, tx) = ChannelRecognizer::new(4);
        tx.send("  hello there ".to_string()).await.unwrap();
        tx.send("   ".to_string()).await.unwrap();
        assert_eq!(rec.recognize().await.unwrap().as_deref(), Some("hello there"));
        assert_eq!(rec.recognize().await.unwrap(), None);
        drop(tx);
        assert!(matches!(
            rec.recognize().await,
            Err(VoiceError::ChannelReceive(_))
        ));
    }
}
