//! Checkout adapter: turns the callback-shaped hosted checkout into one
//! awaited outcome per attempt.

use common_utils::{
    consts::{NO_ERROR_CODE, NO_ERROR_MESSAGE},
    ext_traits::ValueExt,
    CustomResult,
};
use domain_types::{
    errors::UpgradeError,
    types::{CheckoutConfig, CheckoutOutcome},
};
use error_stack::report;
use interfaces::checkout::{CheckoutEvent, CheckoutEventSink, HostedCheckoutProvider};
use secrecy::ExposeSecret;

pub(crate) const PAYMENT_ID_KEYS: [&str; 2] = ["razorpay_payment_id", "payment_id"];
pub(crate) const ORDER_ID_KEYS: [&str; 2] = ["razorpay_order_id", "order_id"];

fn validate_config(config: &CheckoutConfig) -> CustomResult<(), UpgradeError> {
    if config.key_id.expose_secret().is_empty() {
        return Err(report!(UpgradeError::ConfigurationError(
            "checkout key id is not configured"
        )));
    }
    if config.order_id.is_empty() {
        return Err(report!(UpgradeError::ConfigurationError(
            "checkout opened without an order id"
        )));
    }
    if config.amount.get_amount_as_i64() <= 0 {
        return Err(report!(UpgradeError::ConfigurationError(
            "checkout amount must be positive"
        )));
    }
    Ok(())
}

/// A success payload without both ids cannot be captured; reject it here so
/// it never reaches the normalizer as a success.
fn ensure_complete(raw_result: serde_json::Value) -> CustomResult<CheckoutOutcome, UpgradeError> {
    if raw_result.first_str(&PAYMENT_ID_KEYS).is_none() {
        return Err(report!(UpgradeError::IncompleteCheckoutResponse {
            missing: "payment_id"
        }));
    }
    if raw_result.first_str(&ORDER_ID_KEYS).is_none() {
        return Err(report!(UpgradeError::IncompleteCheckoutResponse {
            missing: "order_id"
        }));
    }
    Ok(CheckoutOutcome::Completed { raw_result })
}

/// Open the hosted checkout and wait for exactly one outcome.
///
/// Three things can settle the attempt: the provider's success handler, a
/// user dismissal, or a timer (the modal-open watchdog until the UI reports
/// itself visible, the full-attempt deadline always). The first one wins;
/// returning drops the receiver and both timers, so late callbacks and
/// stale timer fires are inert.
pub async fn open_checkout(
    provider: &dyn HostedCheckoutProvider,
    config: &CheckoutConfig,
) -> CustomResult<CheckoutOutcome, UpgradeError> {
    validate_config(config)?;

    let (sink, mut events) = CheckoutEventSink::channel();
    provider.open(config, sink).await.map_err(|error| {
        let failure = error.current_context().clone();
        error.change_context(UpgradeError::SdkError {
            code: failure.code,
            message: failure.message,
        })
    })?;

    let attempt_deadline = tokio::time::sleep(config.attempt_timeout);
    tokio::pin!(attempt_deadline);
    let watchdog = tokio::time::sleep(config.modal_open_watchdog);
    tokio::pin!(watchdog);
    let mut modal_opened = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(CheckoutEvent::Opened) => {
                    modal_opened = true;
                    tracing::debug!(order_id = %config.order_id, "checkout modal opened");
                }
                Some(CheckoutEvent::Completed { raw_result }) => {
                    return ensure_complete(raw_result);
                }
                Some(CheckoutEvent::Dismissed { reason }) => {
                    return Ok(CheckoutOutcome::Cancelled { reason });
                }
                Some(CheckoutEvent::Errored { code, message }) => {
                    // Some SDK error paths raise with empty strings.
                    return Ok(CheckoutOutcome::Failed {
                        code: if code.is_empty() {
                            NO_ERROR_CODE.to_string()
                        } else {
                            code
                        },
                        message: if message.is_empty() {
                            NO_ERROR_MESSAGE.to_string()
                        } else {
                            message
                        },
                    });
                }
                // Provider dropped the sink without settling the attempt.
                None => {
                    return Err(report!(UpgradeError::SdkError {
                        code: "channel_closed".to_string(),
                        message: "checkout provider ended without a result".to_string(),
                    }));
                }
            },
            _ = &mut watchdog, if !modal_opened => {
                tracing::warn!(order_id = %config.order_id, "checkout UI never appeared");
                return Err(report!(UpgradeError::ModalOpenTimeout));
            }
            _ = &mut attempt_deadline => {
                return Err(report!(UpgradeError::CheckoutExpired));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use common_utils::types::MinorUnit;
    use domain_types::{
        errors::SdkFailure,
        types::{OrderReference, UserContext},
    };
    use serde_json::json;

    use super::*;

    struct ScriptedProvider {
        events: Vec<CheckoutEvent>,
    }

    #[async_trait]
    impl HostedCheckoutProvider for ScriptedProvider {
        async fn open(
            &self,
            _config: &CheckoutConfig,
            sink: CheckoutEventSink,
        ) -> CustomResult<(), SdkFailure> {
            for event in &self.events {
                match event.clone() {
                    CheckoutEvent::Opened => sink.modal_opened(),
                    CheckoutEvent::Completed { raw_result } => sink.success(raw_result),
                    CheckoutEvent::Dismissed { reason } => sink.dismissed(reason),
                    CheckoutEvent::Errored { code, message } => sink.error(code, message),
                }
            }
            Ok(())
        }
    }

    fn test_config(key_id: &str) -> CheckoutConfig {
        let order = OrderReference {
            order_id: "order_123".to_string(),
            amount: MinorUnit::new(99_900),
            currency: "INR".to_string(),
        };
        let user = UserContext {
            user_id: "u1".to_string(),
            contact: "9999999999".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
        };
        CheckoutConfig::new(secrecy::SecretString::new(key_id.to_string()), &order, &user)
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let provider = ScriptedProvider { events: vec![] };
        let result = open_checkout(&provider, &test_config("")).await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &UpgradeError::ConfigurationError("checkout key id is not configured")
        );
    }

    #[tokio::test]
    async fn success_with_both_ids_completes() {
        let provider = ScriptedProvider {
            events: vec![
                CheckoutEvent::Opened,
                CheckoutEvent::Completed {
                    raw_result: json!({
                        "razorpay_payment_id": "pay_1",
                        "razorpay_order_id": "order_123",
                    }),
                },
            ],
        };
        let outcome = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert!(matches!(
            outcome.expect("checkout should complete"),
            CheckoutOutcome::Completed { .. }
        ));
    }

    #[tokio::test]
    async fn success_missing_payment_id_is_rejected() {
        let provider = ScriptedProvider {
            events: vec![
                CheckoutEvent::Opened,
                CheckoutEvent::Completed {
                    raw_result: json!({ "razorpay_order_id": "order_123" }),
                },
            ],
        };
        let result = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &UpgradeError::IncompleteCheckoutResponse {
                missing: "payment_id"
            }
        );
    }

    #[tokio::test]
    async fn dismissal_is_a_cancelled_outcome() {
        let provider = ScriptedProvider {
            events: vec![
                CheckoutEvent::Opened,
                CheckoutEvent::Dismissed {
                    reason: "back pressed".to_string(),
                },
            ],
        };
        let outcome = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert_eq!(
            outcome.expect("dismissal is not an error"),
            CheckoutOutcome::Cancelled {
                reason: "back pressed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn dropped_sink_without_result_is_an_sdk_error() {
        let provider = ScriptedProvider { events: vec![] };
        let result = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &UpgradeError::SdkError {
                code: "channel_closed".to_string(),
                message: "checkout provider ended without a result".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn opened_but_never_settled_expires_after_full_timeout() {
        // Keep a sink alive so the channel stays open with no terminal event.
        struct OpenOnlyProvider {
            keep_alive: std::sync::Mutex<Option<CheckoutEventSink>>,
        }

        #[async_trait]
        impl HostedCheckoutProvider for OpenOnlyProvider {
            async fn open(
                &self,
                _config: &CheckoutConfig,
                sink: CheckoutEventSink,
            ) -> CustomResult<(), SdkFailure> {
                sink.modal_opened();
                if let Ok(mut guard) = self.keep_alive.lock() {
                    *guard = Some(sink);
                }
                Ok(())
            }
        }

        let provider = OpenOnlyProvider {
            keep_alive: std::sync::Mutex::new(None),
        };
        let result = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &UpgradeError::CheckoutExpired
        );
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_fires_when_modal_never_opens() {
        struct NeverOpensProvider {
            keep_alive: std::sync::Mutex<Option<CheckoutEventSink>>,
        }

        #[async_trait]
        impl HostedCheckoutProvider for NeverOpensProvider {
            async fn open(
                &self,
                _config: &CheckoutConfig,
                sink: CheckoutEventSink,
            ) -> CustomResult<(), SdkFailure> {
                if let Ok(mut guard) = self.keep_alive.lock() {
                    *guard = Some(sink);
                }
                Ok(())
            }
        }

        let provider = NeverOpensProvider {
            keep_alive: std::sync::Mutex::new(None),
        };
        let result = open_checkout(&provider, &test_config("rzp_test_key")).await;
        assert_eq!(
            result.unwrap_err().current_context(),
            &UpgradeError::ModalOpenTimeout
        );
    }
}
