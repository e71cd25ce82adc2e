//! Error types for the Icon Voice adapters

use thiserror::Error;

/// Result type alias for voice operations
pub type VoiceResult<T> = Result<T, VoiceError>;

/// Errors that can occur in the voice adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("Speech recognition is not supported on this platform")]
    RecognitionUnsupported,

    #[error("Speech synthesis is not supported on this platform")]
    SynthesisUnsupported,

    #[error("Recognition error: {0}")]
    Recognition(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Channel receive error: {0}")]
    ChannelReceive(String),

    #[error("Listening cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}
