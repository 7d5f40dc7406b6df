//! Seam for the hosted checkout capability.
//!
//! The real SDK is callback-shaped: it calls a success handler, a dismiss
//! handler, or throws. Providers adapt those callbacks onto a
//! [`CheckoutEventSink`]; the adapter on the other side of the channel awaits
//! exactly one terminal event per attempt. Once the attempt settles the
//! receiver is dropped, so any late callback becomes a no-op send instead of
//! a double resolution.

use async_trait::async_trait;
use common_utils::CustomResult;
use domain_types::{errors::SdkFailure, types::CheckoutConfig};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutEvent {
    /// The hosted UI became visible. Disarms the modal-open watchdog.
    Opened,
    /// Success handler fired with the raw, loosely-typed result.
    Completed { raw_result: serde_json::Value },
    /// User dismissed the UI.
    Dismissed { reason: String },
    /// The SDK raised an error after launch.
    Errored { code: String, message: String },
}

/// Handle given to a provider for reporting checkout progress.
#[derive(Debug, Clone)]
pub struct CheckoutEventSink {
    tx: mpsc::UnboundedSender<CheckoutEvent>,
}

impl CheckoutEventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CheckoutEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn modal_opened(&self) {
        let _ = self.tx.send(CheckoutEvent::Opened);
    }

    pub fn success(&self, raw_result: serde_json::Value) {
        let _ = self.tx.send(CheckoutEvent::Completed { raw_result });
    }

    pub fn dismissed(&self, reason: impl Into<String>) {
        let _ = self.tx.send(CheckoutEvent::Dismissed {
            reason: reason.into(),
        });
    }

    pub fn error(&self, code: impl Into<String>, message: impl Into<String>) {
        let _ = self.tx.send(CheckoutEvent::Errored {
            code: code.into(),
            message: message.into(),
        });
    }
}

/// The external hosted-checkout capability. `open` returns once the UI has
/// been asked to launch; progress and the eventual outcome arrive through the
/// sink. A synchronous launch failure (bad key, modal could not be created)
/// is reported as `SdkFailure`.
#[async_trait]
pub trait HostedCheckoutProvider: Send + Sync {
    async fn open(
        &self,
        config: &CheckoutConfig,
        events: CheckoutEventSink,
    ) -> CustomResult<(), SdkFailure>;
}
