//! **VoiceOutput**: persona speech playback with supersession and a text fallback.
//!
//! Each `speak` cancels whatever utterance is still playing so audio never overlaps.
//! When the platform has no synthesis capability the reply goes to a `ReplyNotifier`
//! instead, so the user always sees what the persona said.

use crate::error::VoiceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

fn default_rate() -> f32 {
    1.0
}

fn default_pitch() -> f32 {
    1.0
}

/// Voice settings a persona hands to the synthesizer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicePreference {
    /// Platform voice name (e.g. "en-US-male", "shimmer").
    pub voice: String,
    #[serde(default = "default_rate")]
    pub rate: f32,
    #[serde(default = "default_pitch")]
    pub pitch: f32,
}

impl Default for VoicePreference {
    fn default() -> Self {
        Self {
            voice: "default".to_string(),
            rate: default_rate(),
            pitch: default_pitch(),
        }
    }
}

impl VoicePreference {
    pub fn named(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            ..Default::default()
        }
    }
}

/// Platform speech synthesizer. `speak` resolves when playback ends; the adapter drops the
/// future to interrupt it.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn is_supported(&self) -> bool;

    async fn speak(&self, text: &str, voice: &VoicePreference) -> VoiceResult<()>;
}

/// Synchronous on-screen fallback for replies that cannot be spoken.
pub trait ReplyNotifier: Send + Sync {
    fn notify(&self, text: &str);
}

/// Notifier that writes the reply to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl ReplyNotifier for LogNotifier {
    fn notify(&self, text: &str) {
        info!(target: "icon::voice", reply = %text, "reply shown as text");
    }
}

/// Synthesizer for platforms without speech output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for NoSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str, _voice: &VoicePreference) -> VoiceResult<()> {
        Err(crate::error::VoiceError::SynthesisUnsupported)
    }
}

/// Placeholder synthesizer: logs the utterance and finishes immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderTts;

#[async_trait]
impl SpeechSynthesizer for PlaceholderTts {
    fn is_supported(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, voice: &VoicePreference) -> VoiceResult<()> {
        debug!(target: "icon::voice", voice = %voice.voice, chars = text.len(), "placeholder speech");
        Ok(())
    }
}

/// How a reply reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechDelivery {
    /// Playback was handed to the synthesizer.
    Started,
    /// No synthesis capability; the notifier displayed the text.
    Fallback,
    /// Nothing to say.
    Skipped,
}

struct Playback {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Manages persona speech. Call `stop()` when the chat surface closes.
pub struct VoiceOutput {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    notifier: Arc<dyn ReplyNotifier>,
    current: Mutex<Option<Playback>>,
}

impl VoiceOutput {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, notifier: Arc<dyn ReplyNotifier>) -> Self {
        Self {
            synthesizer,
            notifier,
            current: Mutex::new(None),
        }
    }

    /// Whether the wrapped synthesizer is available.
    pub fn is_supported(&self) -> bool {
        self.synthesizer.is_supported()
    }

    /// Speak `text` without waiting for playback. Supersedes any utterance still playing.
    pub async fn speak(&self, text: &str, voice: &VoicePreference) -> SpeechDelivery {
        let text = text.trim();
        if text.is_empty() {
            return SpeechDelivery::Skipped;
        }
        if !self.synthesizer.is_supported() {
            self.notifier.notify(text);
            return SpeechDelivery::Fallback;
        }

        let mut current = self.current.lock().await;
        if let Some(previous) = current.take() {
            if !previous.task.is_finished() {
                debug!(target: "icon::voice", "superseding in-flight speech");
            }
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let synthesizer = Arc::clone(&self.synthesizer);
        let notifier = Arc::clone(&self.notifier);
        let text = text.to_string();
        let voice = voice.clone();

        let task = tokio::spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {
                    debug!(target: "icon::voice", "speech cancelled");
                }
                result = synthesizer.speak(&text, &voice) => {
                    if let Err(e) = result {
                        warn!(target: "icon::voice", error = %e, "speech failed; showing text");
                        notifier.notify(&text);
                    }
                }
            }
        });

        *current = Some(Playback { cancel, task });
        SpeechDelivery::Started
    }

    /// Stop playback immediately.
    pub async fn stop(&self) {
        if let Some(playback) = self.current.lock().await.take() {
            playback.cancel.cancel();
            info!(target: "icon::voice", "VoiceOutput: stopped");
        }
    }

    /// Whether an utterance is still playing.
    pub async fn is_playing(&self) -> bool {
        self.current
            .lock()
            .await
            .as_ref()
            .map(|p| !p.task.is_finished())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct CollectingNotifier(StdMutex<Vec<String>>);

    impl ReplyNotifier for CollectingNotifier {
        fn notify(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn voice_preference_defaults() {
        let v = VoicePreference::named("onyx");
        assert_eq!(v.voice, "onyx");
        assert!((v.rate - 1.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn unsupported_falls_back_to_text() {
        let notifier = Arc::new(CollectingNotifier::default());
        let output = VoiceOutput::new(Arc::new(NoSynthesizer), notifier.clone());
        let delivery = output.speak("bars on bars", &VoicePreference::default()).await;
        assert_eq!(delivery, SpeechDelivery::Fallback);
        assert_eq!(*notifier.0.lock().unwrap(), vec!["bars on bars".to_string()]);
    }

    #[tokio::test]
    async fn blank_text_is_skipped() {
        let output = VoiceOutput::new(Arc::new(PlaceholderTts), Arc::new(LogNotifier));
        assert_eq!(
            output.speak("   ", &VoicePreference::default()).await,
            SpeechDelivery::Skipped
        );
    }
}
