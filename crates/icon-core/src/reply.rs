//! Reply generation for persona messages.
//!
//! `TemplateReplyGenerator` is the default: deterministic canned lines, no network.
//! `OpenRouterReplyGenerator` sends the same inputs to an OpenAI-compatible chat endpoint.
//! Both sit behind `ReplyGenerator`, so the controller never knows which one it has.
//!
//! API key for the remote generator: `OPENROUTER_API_KEY`. Model: `ICON_REPLY_MODEL`
//! (default `meta-llama/llama-3.3-70b-instruct`).

use crate::error::{CoreError, CoreResult};
use crate::persona::{ActionKind, PersonaCatalog, PersonaId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

/// Maps (persona, action, user text) to the persona's reply. May take time; the controller
/// bounds it with a timeout and drops the future when the chat surface closes.
///
/// For `RequestAction` the input is the transcript line describing the request.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate_reply(
        &self,
        persona: PersonaId,
        kind: ActionKind,
        input: &str,
    ) -> CoreResult<String>;
}

const TAGLINES: [&str; 4] = [
    "Run that back and we'll put it on wax.",
    "That's a whole verse waiting to happen.",
    "Stay tuned to Block Radio for the rest.",
    "The studio's open, let's build on it.",
];

/// Deterministic canned replies. Same persona and input always give the same line.
pub struct TemplateReplyGenerator {
    catalog: Arc<PersonaCatalog>,
}

impl TemplateReplyGenerator {
    pub fn new(catalog: Arc<PersonaCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ReplyGenerator for TemplateReplyGenerator {
    async fn generate_reply(
        &self,
        persona: PersonaId,
        kind: ActionKind,
        input: &str,
    ) -> CoreResult<String> {
        let persona = self
            .catalog
            .get(persona)
            .ok_or_else(|| CoreError::Generation(format!("unknown persona {}", persona)))?;
        let tagline = TAGLINES[persona.id.0 % TAGLINES.len()];
        Ok(match kind {
            ActionKind::Speak => format!(
                "{} here. You said: \"{}\". {}",
                persona.display_name,
                input.trim(),
                tagline
            ),
            ActionKind::RequestAction => format!(
                "{} here. Say less, I'm on it. {}",
                persona.display_name, tagline
            ),
        })
    }
}

// OpenAI-compatible request/response
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: String,
}

/// Remote reply generator over an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterReplyGenerator {
    api_key: String,
    base_url: String,
    model: String,
    catalog: Arc<PersonaCatalog>,
    client: reqwest::Client,
}

impl OpenRouterReplyGenerator {
    /// Build from `OPENROUTER_API_KEY` / `ICON_REPLY_MODEL`. Returns `None` without a key.
    pub fn from_env(catalog: Arc<PersonaCatalog>) -> Option<Self> {
        let key = std::env::var("OPENROUTER_API_KEY").ok()?.trim().to_string();
        if key.is_empty() {
            return None;
        }
        let generator = Self::new(key, catalog);
        Some(match std::env::var("ICON_REPLY_MODEL") {
            Ok(model) if !model.trim().is_empty() => generator.with_model(model.trim()),
            _ => generator,
        })
    }

    pub fn new(api_key: String, catalog: Arc<PersonaCatalog>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            api_key: api_key.trim().to_string(),
            base_url: OPENROUTER_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            catalog,
            client,
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Point at another OpenAI-compatible server (e.g. a local proxy).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ReplyGenerator for OpenRouterReplyGenerator {
    async fn generate_reply(
        &self,
        persona: PersonaId,
        kind: ActionKind,
        input: &str,
    ) -> CoreResult<String> {
        let persona = self
            .catalog
            .get(persona)
            .ok_or_else(|| CoreError::Generation(format!("unknown persona {}", persona)))?;

        let mut system = format!(
            "You are {}, {} for The Third Icon Studios. Reply in one or two short, \
             upbeat sentences that can be read aloud. Never mention that you are an AI.",
            persona.display_name, persona.role
        );
        if kind == ActionKind::RequestAction {
            system.push_str(" The user is asking you to do something; say what you will do.");
        }
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: input.to_string(),
                },
            ],
            temperature: Some(0.8),
            max_tokens: Some(160),
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, persona = %persona.display_name, "requesting remote reply");
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(CoreError::Generation(format!("API error {}: {}", status, text)));
        }

        let parsed: ChatResponse = res.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CoreError::Generation("empty completion".to_string()))?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn template_is_deterministic_and_quotes_input() {
        let generator = TemplateReplyGenerator::new(Arc::new(PersonaCatalog::builtin()));
        let a = generator
            .generate_reply(PersonaId(0), ActionKind::Speak, "  hello ")
            .await
            .unwrap();
        let b = generator
            .generate_reply(PersonaId(0), ActionKind::Speak, "hello")
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("Mr. I Got Bars here."));
        assert!(a.contains("\"hello\""));
    }

    #[tokio::test]
    async fn template_rejects_unknown_persona() {
        let generator = TemplateReplyGenerator::new(Arc::new(PersonaCatalog::builtin()));
        let err = generator
            .generate_reply(PersonaId(42), ActionKind::Speak, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Generation(_)));
    }

    #[tokio::test]
    async fn template_request_action_does_not_quote_the_request() {
        let generator = TemplateReplyGenerator::new(Arc::new(PersonaCatalog::builtin()));
        let reply = generator
            .generate_reply(
                PersonaId(0),
                ActionKind::RequestAction,
                "Asked Mr. I Got Bars to take an action",
            )
            .await
            .unwrap();
        assert!(reply.starts_with("Mr. I Got Bars here. Say less, I'm on it."));
        assert!(!reply.contains("You said"));
        assert!(!reply.contains("Asked"));
    }

    #[test]
    fn remote_generator_builder() {
        let generator = OpenRouterReplyGenerator::new(" key ".into(), Arc::new(PersonaCatalog::builtin()))
            .with_model("openai/gpt-4o-mini")
            .with_base_url("http://localhost:8080/v1/");
        assert_eq!(generator.model(), "openai/gpt-4o-mini");
        assert_eq!(generator.base_url, "http://localhost:8080/v1");
        assert_eq!(generator.api_key, "key");
    }
}
