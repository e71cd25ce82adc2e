//! Interaction Controller: the only writer of the chat session.
//!
//! One costed action at a time. Each action is checked against the balance, answered by the
//! reply generator under a timeout, committed to the session in one step, then handed to
//! voice output. Closing the surface cancels listening and speech and discards any reply
//! still being generated; reopening starts a fresh session.

use crate::checkout::{open_top_up, CheckoutOpener, LogCheckoutOpener, TopUp};
use crate::persona::{ActionKind, Persona, PersonaCatalog};
use crate::reply::ReplyGenerator;
use crate::session::Session;
use icon_voice::{
    ListenConfig, LogNotifier, NoRecognizer, NoSynthesizer, RecognitionEvent, SpeechDelivery,
    VoiceError, VoiceInput, VoiceOutput,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Controller settings; usually built with `StudioConfig::controller_config`.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub starting_balance: u64,
    pub reply_timeout: Duration,
    pub top_up: TopUp,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            starting_balance: 300,
            reply_timeout: Duration::from_secs(4),
            top_up: TopUp {
                url: None,
                credits: 500,
            },
        }
    }
}

/// Platform capability an action depended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SpeechRecognition,
}

/// Non-fatal remarks attached to a completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Note {
    /// The reply was shown as text because speech output is unavailable.
    SynthesisUnavailable,
}

/// Result of one action, reported to the surface as inline state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    Completed {
        reply: String,
        balance: u64,
        notes: Vec<Note>,
    },
    InsufficientTokens {
        cost: u64,
        balance: u64,
        shortfall: u64,
        top_up: TopUp,
    },
    UnsupportedCapability {
        capability: Capability,
    },
    GenerationTimedOut {
        after_ms: u64,
    },
    GenerationFailed {
        message: String,
    },
    /// Another action is still in flight.
    Busy,
    /// `Speak` with blank text.
    EmptyUtterance,
    /// Listening ended without a recognized utterance.
    NoUtterance {
        reason: String,
    },
    /// The surface closed while the action was in flight; nothing was applied.
    Discarded,
    /// The surface is closed; open it first.
    SurfaceClosed,
}

impl ActionOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed { .. })
    }

    pub fn reply(&self) -> Option<&str> {
        match self {
            ActionOutcome::Completed { reply, .. } => Some(reply),
            _ => None,
        }
    }
}

struct Surface {
    session: Option<Session>,
    epoch: u64,
    cancel: CancellationToken,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct InteractionController {
    config: ControllerConfig,
    catalog: Arc<PersonaCatalog>,
    replies: Arc<dyn ReplyGenerator>,
    input: VoiceInput,
    output: VoiceOutput,
    checkout: Arc<dyn CheckoutOpener>,
    surface: RwLock<Surface>,
    busy: AtomicBool,
}

impl InteractionController {
    /// Controller with an open surface and no speech capabilities. Attach platform adapters
    /// with `with_voice_input` / `with_voice_output`.
    pub fn new(
        config: ControllerConfig,
        catalog: Arc<PersonaCatalog>,
        replies: Arc<dyn ReplyGenerator>,
    ) -> Self {
        let session = Session::new(config.starting_balance);
        Self {
            config,
            catalog,
            replies,
            input: VoiceInput::new(Arc::new(NoRecognizer), ListenConfig::default()),
            output: VoiceOutput::new(Arc::new(NoSynthesizer), Arc::new(LogNotifier)),
            checkout: Arc::new(LogCheckoutOpener),
            surface: RwLock::new(Surface {
                session: Some(session),
                epoch: 1,
                cancel: CancellationToken::new(),
            }),
            busy: AtomicBool::new(false),
        }
    }

    pub fn with_voice_input(mut self, input: VoiceInput) -> Self {
        self.input = input;
        self
    }

    pub fn with_voice_output(mut self, output: VoiceOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_checkout(mut self, checkout: Arc<dyn CheckoutOpener>) -> Self {
        self.checkout = checkout;
        self
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn voice_input(&self) -> &VoiceInput {
        &self.input
    }

    pub fn voice_output(&self) -> &VoiceOutput {
        &self.output
    }

    /// Whether an action is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(&self.busy))
    }

    fn insufficient(&self, cost: u64, balance: u64) -> ActionOutcome {
        ActionOutcome::InsufficientTokens {
            cost,
            balance,
            shortfall: cost.saturating_sub(balance),
            top_up: self.config.top_up.clone(),
        }
    }

    /// Run one costed action against the open session.
    pub async fn perform_action(
        &self,
        kind: ActionKind,
        persona: &Persona,
        input_text: &str,
    ) -> ActionOutcome {
        let Some(_guard) = self.try_acquire() else {
            debug!(action = kind.as_str(), "rejected: action already in flight");
            return ActionOutcome::Busy;
        };

        let input_text = input_text.trim();
        if kind == ActionKind::Speak && input_text.is_empty() {
            return ActionOutcome::EmptyUtterance;
        }

        let cost = persona.cost(kind);
        let (epoch, cancel) = {
            let surface = self.surface.read().await;
            let Some(session) = surface.session.as_ref() else {
                return ActionOutcome::SurfaceClosed;
            };
            if !session.can_afford(cost) {
                info!(
                    action = kind.as_str(),
                    cost,
                    balance = session.token_balance(),
                    "insufficient tokens"
                );
                return self.insufficient(cost, session.token_balance());
            }
            (surface.epoch, surface.cancel.clone())
        };

        let user_text = match kind {
            ActionKind::Speak => input_text.to_string(),
            ActionKind::RequestAction => describe_request(persona, input_text),
        };

        let timeout = self.config.reply_timeout;
        let generation = tokio::time::timeout(
            timeout,
            self.replies.generate_reply(persona.id, kind, &user_text),
        );
        let reply = tokio::select! {
            _ = cancel.cancelled() => {
                info!(persona = %persona.display_name, "surface closed; discarding pending reply");
                return ActionOutcome::Discarded;
            }
            result = generation => match result {
                Err(_) => {
                    warn!(persona = %persona.display_name, ?timeout, "reply generation timed out");
                    return ActionOutcome::GenerationTimedOut {
                        after_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    };
                }
                Ok(Err(e)) => {
                    warn!(persona = %persona.display_name, error = %e, "reply generation failed");
                    return ActionOutcome::GenerationFailed { message: e.to_string() };
                }
                Ok(Ok(reply)) => reply,
            },
        };

        let balance = {
            let mut surface = self.surface.write().await;
            if surface.epoch != epoch || cancel.is_cancelled() {
                return ActionOutcome::Discarded;
            }
            let Some(session) = surface.session.as_mut() else {
                return ActionOutcome::Discarded;
            };
            let before = session.token_balance();
            match session.record_exchange(persona.id, cost, user_text, reply.clone()) {
                Ok(balance) => balance,
                Err(_) => return self.insufficient(cost, before),
            }
        };
        info!(
            action = kind.as_str(),
            persona = %persona.display_name,
            cost,
            balance,
            "action completed"
        );

        let mut notes = Vec::new();
        if self.output.speak(&reply, &persona.voice).await == SpeechDelivery::Fallback {
            notes.push(Note::SynthesisUnavailable);
        }

        ActionOutcome::Completed {
            reply,
            balance,
            notes,
        }
    }

    /// One voice turn: listen for an utterance, then `Speak` it to `persona`.
    ///
    /// Turns that join a session already in progress share its utterance; only the first
    /// to claim it is answered and charged, the others get `Busy`.
    pub async fn listen_and_respond(&self, persona: &Persona) -> ActionOutcome {
        if !self.input.is_supported() {
            return ActionOutcome::UnsupportedCapability {
                capability: Capability::SpeechRecognition,
            };
        }

        let cancel = {
            let surface = self.surface.read().await;
            if surface.session.is_none() {
                return ActionOutcome::SurfaceClosed;
            }
            surface.cancel.clone()
        };

        let mut handle = match self.input.start_listening().await {
            Ok(handle) => handle,
            Err(VoiceError::RecognitionUnsupported) => {
                return ActionOutcome::UnsupportedCapability {
                    capability: Capability::SpeechRecognition,
                }
            }
            Err(e) => {
                return ActionOutcome::NoUtterance {
                    reason: e.to_string(),
                }
            }
        };

        let event = tokio::select! {
            _ = cancel.cancelled() => return ActionOutcome::Discarded,
            event = handle.wait() => event,
        };

        match event {
            RecognitionEvent::Recognized(text) => {
                if !handle.claim() {
                    debug!(session = handle.id(), "utterance already taken by another voice turn");
                    return ActionOutcome::Busy;
                }
                debug!(chars = text.len(), "utterance recognized");
                self.perform_action(ActionKind::Speak, persona, &text).await
            }
            RecognitionEvent::TimedOut => ActionOutcome::NoUtterance {
                reason: "listening timed out".to_string(),
            },
            RecognitionEvent::Error(reason) => ActionOutcome::NoUtterance { reason },
        }
    }

    /// Close the chat surface: cancel listening and speech, drop the session.
    pub async fn close_surface(&self) {
        {
            let mut surface = self.surface.write().await;
            if surface.session.is_none() {
                return;
            }
            surface.cancel.cancel();
            surface.session = None;
            info!(epoch = surface.epoch, "chat surface closed");
        }
        self.input.cancel().await;
        self.output.stop().await;
    }

    /// Open the chat surface with a fresh session. No-op when already open.
    pub async fn open_surface(&self) {
        let mut surface = self.surface.write().await;
        if surface.session.is_some() {
            return;
        }
        surface.epoch += 1;
        surface.cancel = CancellationToken::new();
        surface.session = Some(Session::new(self.config.starting_balance));
        info!(
            epoch = surface.epoch,
            balance = self.config.starting_balance,
            "chat surface opened"
        );
    }

    pub async fn is_open(&self) -> bool {
        self.surface.read().await.session.is_some()
    }

    /// Open the checkout link. Never changes the balance.
    pub fn buy_credits(&self) -> TopUp {
        let top_up = self.config.top_up.clone();
        open_top_up(self.checkout.as_ref(), &top_up);
        top_up
    }

    /// Credit tokens on the host's say-so (e.g. after it confirmed a purchase elsewhere).
    /// Returns the new balance, or `None` when the surface is closed.
    pub async fn grant_credits(&self, amount: u64) -> Option<u64> {
        let mut surface = self.surface.write().await;
        let session = surface.session.as_mut()?;
        let balance = session.credit(amount);
        info!(amount, balance, "credits granted");
        Some(balance)
    }

    pub async fn balance(&self) -> Option<u64> {
        self.surface
            .read()
            .await
            .session
            .as_ref()
            .map(Session::token_balance)
    }

    /// Copy of the current session for rendering.
    pub async fn session_snapshot(&self) -> Option<Session> {
        self.surface.read().await.session.clone()
    }
}

fn describe_request(persona: &Persona, input: &str) -> String {
    if input.is_empty() {
        format!("Asked {} to take an action", persona.display_name)
    } else {
        format!("Asked {} to: {}", persona.display_name, input)
    }
}
