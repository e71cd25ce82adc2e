//! Studio configuration loaded from TOML and environment.
//!
//! Precedence: env `ICON__*` > file (`ICON_CONFIG`, default `config/studio`) > defaults.
//!
//! | Key | Env | Default | Description |
//! |-----|-----|---------|-------------|
//! | app_name | ICON__APP_NAME | The Third Icon Studios | Banner shown by hosts. |
//! | starting_balance | ICON__STARTING_BALANCE | 300 | Mock tokens for each fresh session. |
//! | reply_timeout_ms | ICON__REPLY_TIMEOUT_MS | 4000 | Upper bound on one reply generation. |
//! | listen_timeout_ms | ICON__LISTEN_TIMEOUT_MS | 10000 | Upper bound on one listening session. |
//! | reply_backend | ICON__REPLY_BACKEND | template | `template` or `openrouter`. |
//! | checkout.url | ICON__CHECKOUT__URL | unset | Hosted checkout link for credits. |
//! | checkout.credits | ICON__CHECKOUT__CREDITS | 500 | Credits the link is sold as. |

use crate::checkout::TopUp;
use crate::controller::ControllerConfig;
use crate::error::{CoreError, CoreResult};
use crate::persona::{PersonaCatalog, PersonaSpec};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_APP_NAME: &str = "The Third Icon Studios";

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_starting_balance() -> u64 {
    300
}

fn default_reply_timeout_ms() -> u64 {
    4_000
}

fn default_listen_timeout_ms() -> u64 {
    10_000
}

fn default_checkout_credits() -> u64 {
    500
}

/// Which reply generator the host wires into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyBackend {
    #[default]
    Template,
    OpenRouter,
}

impl ReplyBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyBackend::Template => "template",
            ReplyBackend::OpenRouter => "openrouter",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_checkout_credits")]
    pub credits: u64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            url: None,
            credits: default_checkout_credits(),
        }
    }
}

/// Static presentation links (radio stream, music profiles, NFT gallery). The controller
/// never reads these; hosts render them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioLinks {
    #[serde(default)]
    pub radio_url: Option<String>,
    #[serde(default)]
    pub music_url: Option<String>,
    #[serde(default)]
    pub nft_gallery_url: Option<String>,
}

impl StudioLinks {
    /// Configured links as (label, url) pairs.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Block Radio", self.radio_url.as_deref()),
            ("Music Hub", self.music_url.as_deref()),
            ("NFT Gallery", self.nft_gallery_url.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.map(|u| (label, u)))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u64,
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    #[serde(default = "default_listen_timeout_ms")]
    pub listen_timeout_ms: u64,
    #[serde(default)]
    pub reply_backend: ReplyBackend,
    #[serde(default)]
    pub checkout: CheckoutConfig,
    #[serde(default)]
    pub links: StudioLinks,
    /// Overrides the built-in persona catalog when non-empty.
    #[serde(default)]
    pub personas: Vec<PersonaSpec>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            starting_balance: default_starting_balance(),
            reply_timeout_ms: default_reply_timeout_ms(),
            listen_timeout_ms: default_listen_timeout_ms(),
            reply_backend: ReplyBackend::default(),
            checkout: CheckoutConfig::default(),
            links: StudioLinks::default(),
            personas: Vec::new(),
        }
    }
}

impl StudioConfig {
    /// Load from `ICON_CONFIG` (default `config/studio`, extension optional) and `ICON__*` env.
    pub fn load() -> CoreResult<Self> {
        let config_path =
            std::env::var("ICON_CONFIG").unwrap_or_else(|_| "config/studio".to_string());
        Self::load_from(&config_path)
    }

    /// Load from an explicit file path (missing file is fine) plus `ICON__*` env.
    pub fn load_from(path: &str) -> CoreResult<Self> {
        let built = config::Config::builder()
            .set_default("app_name", DEFAULT_APP_NAME)?
            .set_default("starting_balance", default_starting_balance() as i64)?
            .set_default("reply_timeout_ms", default_reply_timeout_ms() as i64)?
            .set_default("listen_timeout_ms", default_listen_timeout_ms() as i64)?
            .set_default("reply_backend", ReplyBackend::Template.as_str())?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("ICON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let parsed: Self = built.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse a TOML document directly (no env layering).
    pub fn from_toml_str(source: &str) -> CoreResult<Self> {
        let built = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        let parsed: Self = built.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.reply_timeout_ms == 0 {
            return Err(CoreError::Config("reply_timeout_ms must be > 0".to_string()));
        }
        if self.listen_timeout_ms == 0 {
            return Err(CoreError::Config("listen_timeout_ms must be > 0".to_string()));
        }
        if self.checkout.credits == 0 {
            return Err(CoreError::Config("checkout.credits must be > 0".to_string()));
        }
        if let Some(url) = self.checkout.url.as_deref() {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(CoreError::Config(format!(
                    "checkout.url must be an http(s) link, got '{}'",
                    url
                )));
            }
        }
        if !self.personas.is_empty() {
            PersonaCatalog::from_specs(self.personas.clone())?;
        }
        Ok(())
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn listen_timeout(&self) -> Duration {
        Duration::from_millis(self.listen_timeout_ms)
    }

    pub fn top_up(&self) -> TopUp {
        TopUp {
            url: self.checkout.url.clone(),
            credits: self.checkout.credits,
        }
    }

    /// Configured catalog, or the built-in line-up when none is configured.
    pub fn persona_catalog(&self) -> CoreResult<PersonaCatalog> {
        if self.personas.is_empty() {
            Ok(PersonaCatalog::builtin())
        } else {
            PersonaCatalog::from_specs(self.personas.clone())
        }
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            starting_balance: self.starting_balance,
            reply_timeout: self.reply_timeout(),
            top_up: self.top_up(),
        }
    }
}
