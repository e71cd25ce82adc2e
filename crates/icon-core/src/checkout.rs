//! Hosted checkout link for buying more mock tokens.
//!
//! The core only opens the link. Nothing comes back from checkout: no webhook, no
//! confirmation, no balance change. Hosts that reconcile purchases call
//! `InteractionController::grant_credits` themselves.

use crate::error::CoreResult;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Suggested top-up attached to an `InsufficientTokens` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopUp {
    /// Checkout link; `None` when no link is configured.
    pub url: Option<String>,
    /// Credits the link is sold as.
    pub credits: u64,
}

/// Opens an external URL (new browser tab, system opener, ...).
pub trait CheckoutOpener: Send + Sync {
    fn open(&self, url: &str) -> CoreResult<()>;
}

/// Opener that only logs the link. Default for headless hosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCheckoutOpener;

impl CheckoutOpener for LogCheckoutOpener {
    fn open(&self, url: &str) -> CoreResult<()> {
        info!(%url, "checkout link requested");
        Ok(())
    }
}

/// Open the top-up link if one is configured. Failures are logged, never surfaced.
pub(crate) fn open_top_up(opener: &dyn CheckoutOpener, top_up: &TopUp) -> bool {
    match top_up.url.as_deref() {
        Some(url) => match opener.open(url) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to open checkout link");
                false
            }
        },
        None => {
            warn!("no checkout link configured; set checkout.url");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl CheckoutOpener for Recorder {
        fn open(&self, url: &str) -> CoreResult<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    struct Refuses;

    impl CheckoutOpener for Refuses {
        fn open(&self, _url: &str) -> CoreResult<()> {
            Err(CoreError::Checkout("popup blocked".to_string()))
        }
    }

    #[test]
    fn opens_configured_link() {
        let recorder = Recorder::default();
        let top_up = TopUp {
            url: Some("https://checkout.example/credits".to_string()),
            credits: 500,
        };
        assert!(open_top_up(&recorder, &top_up));
        assert_eq!(recorder.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn missing_link_or_failure_is_not_fatal() {
        let top_up = TopUp { url: None, credits: 500 };
        assert!(!open_top_up(&LogCheckoutOpener, &top_up));

        let top_up = TopUp {
            url: Some("https://checkout.example/credits".to_string()),
            credits: 500,
        };
        assert!(!open_top_up(&Refuses, &top_up));
    }
}
