//! # Icon Voice - speech capability adapters for the avatar chat panel
//!
//! Wraps the platform's speech recognition and speech synthesis behind injected
//! capability traits, so the interaction controller never discovers them ambiently.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Voice Adapters                           │
//! │  ┌──────────────────┐   one utterance   ┌─────────────────┐  │
//! │  │ SpeechRecognizer │ ───────────────→  │   VoiceInput    │  │
//! │  │   (platform)     │                   │ Idle/Listening  │  │
//! │  └──────────────────┘                   └─────────────────┘  │
//! │                                                  ↓            │
//! │                                        Interaction Controller │
//! │                                                  ↓            │
//! │  ┌──────────────────┐   supersede       ┌─────────────────┐  │
//! │  │ SpeechSynthesizer│ ←──────────────── │   VoiceOutput   │  │
//! │  │   (platform)     │   text fallback → │  ReplyNotifier  │  │
//! │  └──────────────────┘                   └─────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod listener;
pub mod recognizer;
pub mod voice_output;

pub use error::{VoiceError, VoiceResult};
pub use listener::{ListenConfig, ListeningHandle, ListeningState, RecognitionEvent, VoiceInput};
pub use recognizer::{ChannelRecognizer, NoRecognizer, ScriptedRecognizer, SpeechRecognizer};
pub use voice_output::{
    LogNotifier, NoSynthesizer, PlaceholderTts, ReplyNotifier, SpeechDelivery, SpeechSynthesizer,
    VoiceOutput, VoicePreference,
};
