//! Session state for one visit: mock token balance and the chat transcript.
//!
//! Pure data. Only the interaction controller mutates a session, and every mutation
//! either applies in full or not at all.

use crate::error::{CoreError, CoreResult};
use crate::persona::PersonaId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Persona,
}

/// One transcript entry. Never edited after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub speaker: Speaker,
    /// Persona the exchange was addressed to.
    pub persona: PersonaId,
    pub text: String,
    /// Display only; transcript order is append order.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    token_balance: u64,
    transcript: Vec<Message>,
}

impl Session {
    pub fn new(starting_balance: u64) -> Self {
        Self {
            token_balance: starting_balance,
            transcript: Vec::new(),
        }
    }

    pub fn token_balance(&self) -> u64 {
        self.token_balance
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.token_balance >= cost
    }

    /// Debit `cost` and append the user message followed by the persona reply.
    /// Returns the new balance. Nothing changes when the balance is short.
    pub(crate) fn record_exchange(
        &mut self,
        persona: PersonaId,
        cost: u64,
        user_text: String,
        reply: String,
    ) -> CoreResult<u64> {
        let remaining = self
            .token_balance
            .checked_sub(cost)
            .ok_or(CoreError::InsufficientTokens {
                cost,
                balance: self.token_balance,
            })?;

        let now = Utc::now();
        self.token_balance = remaining;
        self.transcript.push(Message {
            speaker: Speaker::User,
            persona,
            text: user_text,
            timestamp: now,
        });
        self.transcript.push(Message {
            speaker: Speaker::Persona,
            persona,
            text: reply,
            timestamp: now,
        });
        Ok(remaining)
    }

    /// Add host-granted credits. Saturates instead of wrapping.
    pub(crate) fn credit(&mut self, amount: u64) -> u64 {
        self.token_balance = self.token_balance.saturating_add(amount);
        self.token_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_debits_and_appends_in_order() {
        let mut session = Session::new(300);
        let balance = session
            .record_exchange(PersonaId(0), 10, "yo".into(), "what's good".into())
            .unwrap();
        assert_eq!(balance, 290);
        let speakers: Vec<Speaker> = session.transcript().iter().map(|m| m.speaker).collect();
        assert_eq!(speakers, vec![Speaker::User, Speaker::Persona]);
        assert_eq!(session.transcript()[1].text, "what's good");
    }

    #[test]
    fn short_balance_leaves_session_untouched() {
        let mut session = Session::new(5);
        let err = session
            .record_exchange(PersonaId(0), 10, "yo".into(), "nope".into())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientTokens { cost: 10, balance: 5 }));
        assert_eq!(session.token_balance(), 5);
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn exact_balance_reaches_zero() {
        let mut session = Session::new(10);
        assert!(session.can_afford(10));
        session
            .record_exchange(PersonaId(1), 10, "last one".into(), "ok".into())
            .unwrap();
        assert_eq!(session.token_balance(), 0);
        assert!(!session.can_afford(1));
    }

    #[test]
    fn credit_saturates() {
        let mut session = Session::new(u64::MAX - 1);
        assert_eq!(session.credit(10), u64::MAX);
    }
}
