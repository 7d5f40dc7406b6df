use strum::Display;

/// Transport-level failures from the shared HTTP client.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum ApiClientError {
    #[error("Invalid URL for backend request")]
    UrlEncodingFailed,
    #[error("Client construction failed")]
    ClientConstructionFailed,
    #[error("Request body serialization failed")]
    BodySerializationFailed,
    #[error("Failed to send request to backend {0}")]
    RequestNotSent(String),
    #[error("Failed to decode response")]
    ResponseDecodingFailed,
    #[error("Server responded with Request Timeout")]
    RequestTimeoutReceived,
    #[error("Server responded with Internal Server Error")]
    InternalServerErrorReceived,
    #[error("Server responded with Bad Gateway")]
    BadGatewayReceived,
    #[error("Server responded with Service Unavailable")]
    ServiceUnavailableReceived,
    #[error("Server responded with Gateway Timeout")]
    GatewayTimeoutReceived,
    #[error("Server responded with unexpected response")]
    UnexpectedServerResponse,
}

impl ApiClientError {
    pub fn is_upstream_timeout(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeoutReceived | Self::GatewayTimeoutReceived
        )
    }
}

/// Everything that can end a plan upgrade attempt early.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum UpgradeError {
    #[error("An upgrade attempt is already in progress")]
    AlreadyInProgress,
    #[error("Order creation failed: {message}")]
    OrderCreationFailed { message: String },
    #[error("Checkout configuration invalid: {0}")]
    ConfigurationError(&'static str),
    #[error("Checkout UI did not open in time")]
    ModalOpenTimeout,
    #[error("Checkout attempt timed out")]
    CheckoutExpired,
    #[error("User dismissed the checkout")]
    UserCancelled { reason: String },
    #[error("Checkout SDK error {code}: {message}")]
    SdkError { code: String, message: String },
    #[error("Checkout response missing required fields: {missing}")]
    IncompleteCheckoutResponse { missing: &'static str },
    #[error("Backend rejected the capture: {message}")]
    CaptureRejected { message: String },
    #[error("Capture request could not reach the backend")]
    CaptureTransportError,
    #[error("Plan activation failed: {message}")]
    ActivationFailed { message: String },
}

impl UpgradeError {
    /// Fixed user-facing message per failure category. Wording is stable so
    /// the app can match on it for styling; never include backend internals.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AlreadyInProgress => "A payment is already in progress. Please wait.",
            Self::ConfigurationError(_) | Self::ModalOpenTimeout => {
                "Payment could not be started. Please try again later."
            }
            Self::UserCancelled { .. } => "Payment cancelled.",
            Self::IncompleteCheckoutResponse { .. } => {
                "We received an invalid response from the payment provider."
            }
            Self::CheckoutExpired | Self::CaptureTransportError => {
                "Network issue during payment. If money was deducted it will be reconciled."
            }
            Self::OrderCreationFailed { .. }
            | Self::CaptureRejected { .. }
            | Self::ActivationFailed { .. } => {
                "Our server could not complete the upgrade. Please contact support."
            }
            Self::SdkError { .. } => "Something went wrong with the payment. Please try again.",
        }
    }
}

/// A synchronous launch failure from the checkout SDK (bad key, modal could
/// not be constructed). Distinct from the async `Errored` event so the
/// adapter can fail fast without waiting on the watchdog.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Checkout SDK failed to launch ({code}): {message}")]
pub struct SdkFailure {
    pub code: String,
    pub message: String,
}

/// Failures inside the post-capture reconciliation passes. Logged, never
/// propagated: the upgrade already succeeded at capture time.
#[derive(Debug, Clone, thiserror::Error, Display)]
pub enum ReconciliationError {
    RefreshFailed(String),
    HolderTornDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_user_message() {
        let variants = [
            UpgradeError::AlreadyInProgress,
            UpgradeError::OrderCreationFailed {
                message: "m".into(),
            },
            UpgradeError::ConfigurationError("missing key id"),
            UpgradeError::ModalOpenTimeout,
            UpgradeError::CheckoutExpired,
            UpgradeError::UserCancelled {
                reason: "back".into(),
            },
            UpgradeError::SdkError {
                code: "1".into(),
                message: "m".into(),
            },
            UpgradeError::IncompleteCheckoutResponse {
                missing: "payment_id",
            },
            UpgradeError::CaptureRejected {
                message: "m".into(),
            },
            UpgradeError::CaptureTransportError,
            UpgradeError::ActivationFailed {
                message: "m".into(),
            },
        ];
        for error in variants {
            assert!(!error.user_message().is_empty());
        }
    }

    #[test]
    fn upstream_timeouts_are_distinguished_from_other_transport_errors() {
        assert!(ApiClientError::RequestTimeoutReceived.is_upstream_timeout());
        assert!(ApiClientError::GatewayTimeoutReceived.is_upstream_timeout());
        assert!(!ApiClientError::BadGatewayReceived.is_upstream_timeout());
    }

}
