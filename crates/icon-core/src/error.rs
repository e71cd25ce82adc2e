//! Error types for the Icon Studios core

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Insufficient tokens: action costs {cost}, balance is {balance}")]
    InsufficientTokens { cost: u64, balance: u64 },

    #[error("Reply generation failed: {0}")]
    Generation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Checkout error: {0}")]
    Checkout(String),

    #[error("Voice error: {0}")]
    Voice(#[from] icon_voice::VoiceError),
}
