//! Terminal stand-ins for the browser capabilities: speech output, text fallback and the
//! checkout tab, plus outcome rendering.

use icon_core::icon_voice::{ReplyNotifier, SpeechSynthesizer, VoicePreference, VoiceResult};
use icon_core::{
    ActionOutcome, CheckoutOpener, CoreError, CoreResult, Message, Note, Persona, Speaker,
};
use async_trait::async_trait;
use std::time::Duration;

/// "Speaks" by printing the reply with the voice name, paced like real playback.
pub struct ConsoleSpeaker;

#[async_trait]
impl SpeechSynthesizer for ConsoleSpeaker {
    fn is_supported(&self) -> bool {
        true
    }

    async fn speak(&self, text: &str, voice: &VoicePreference) -> VoiceResult<()> {
        println!("🔊 [{}] {}", voice.voice, text);
        let words = text.split_whitespace().count() as f32;
        let secs = words / (2.5 * voice.rate.max(0.1));
        tokio::time::sleep(Duration::from_secs_f32(secs)).await;
        Ok(())
    }
}

/// On-screen fallback when speech is muted.
pub struct ConsoleNotifier;

impl ReplyNotifier for ConsoleNotifier {
    fn notify(&self, text: &str) {
        println!("💬 {}", text);
    }
}

/// Prints the checkout link and opens it in the default browser.
pub struct ConsoleCheckout;

impl CheckoutOpener for ConsoleCheckout {
    fn open(&self, url: &str) -> CoreResult<()> {
        println!("🛒 Buy credits: {}", url);
        webbrowser::open(url).map_err(|e| CoreError::Checkout(e.to_string()))
    }
}

pub fn render_outcome(outcome: &ActionOutcome, persona: &Persona) -> String {
    match outcome {
        ActionOutcome::Completed { balance, notes, .. } => {
            let mut line = format!("✅ {} tokens left", balance);
            if notes.contains(&Note::SynthesisUnavailable) {
                line.push_str(" (voice unavailable, reply shown as text)");
            }
            line
        }
        ActionOutcome::InsufficientTokens {
            cost,
            balance,
            shortfall,
            top_up,
        } => {
            let mut line = format!(
                "💸 That costs {} tokens and you have {} ({} short).",
                cost, balance, shortfall
            );
            if top_up.url.is_some() {
                line.push_str(&format!(" Type /buy for {} more credits.", top_up.credits));
            }
            line
        }
        ActionOutcome::UnsupportedCapability { capability } => {
            format!("🚫 {:?} is not available here.", capability)
        }
        ActionOutcome::GenerationTimedOut { after_ms } => format!(
            "⏱️ {} took longer than {}ms. Try again.",
            persona.display_name, after_ms
        ),
        ActionOutcome::GenerationFailed { message } => {
            format!("⚠️ {} couldn't answer: {}", persona.display_name, message)
        }
        ActionOutcome::Busy => "⏳ Still working on the last one.".to_string(),
        ActionOutcome::EmptyUtterance => "🤐 Say something first.".to_string(),
        ActionOutcome::NoUtterance { reason } => format!("👂 Didn't catch that ({}).", reason),
        ActionOutcome::Discarded => "🗑️ Reply dropped; the panel was closed.".to_string(),
        ActionOutcome::SurfaceClosed => "📪 The chat panel is closed. Type /open.".to_string(),
    }
}

pub fn render_message(message: &Message, persona_name: &str) -> String {
    match message.speaker {
        Speaker::User => format!("[{}] you: {}", message.timestamp.format("%H:%M:%S"), message.text),
        Speaker::Persona => format!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M:%S"),
            persona_name,
            message.text
        ),
    }
}
