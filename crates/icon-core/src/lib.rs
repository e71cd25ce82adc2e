//! icon-core: the avatar voice-chat core for The Third Icon Studios page.
//!
//! Session state, persona catalog, reply generation, checkout links, configuration and the
//! interaction controller that ties them to the speech adapters in `icon-voice`.

mod checkout;
mod config;
mod controller;
mod error;
mod persona;
mod reply;
mod session;

pub use checkout::{CheckoutOpener, LogCheckoutOpener, TopUp};
pub use config::{CheckoutConfig, ReplyBackend, StudioConfig, StudioLinks};
pub use controller::{ActionOutcome, Capability, ControllerConfig, InteractionController, Note};
pub use error::{CoreError, CoreResult};
pub use persona::{ActionKind, CostTable, Persona, PersonaCatalog, PersonaId, PersonaSpec};
pub use reply::{OpenRouterReplyGenerator, ReplyGenerator, TemplateReplyGenerator};
pub use session::{Message, Session, Speaker};

// Speech adapters, re-exported so hosts depend on one crate.
pub use icon_voice;
