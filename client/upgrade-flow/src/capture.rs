//! Capture service client: hands the normalized payment to the backend
//! ledger for authoritative capture and signature verification.

use async_trait::async_trait;
use common_utils::{
    ext_traits::{ByteSliceExt, ValueExt},
    types::MinorUnit,
    CustomResult,
};
use domain_types::{
    errors::{ApiClientError, UpgradeError},
    types::{CaptureResult, NormalizedPayment, PlanOffer},
};
use error_stack::{report, Report, ResultExt};
use interfaces::upgrade_types::PaymentCapture;
use secrecy::SecretString;
use serde::Serialize;

use crate::api_client::{call_backend_api, Method};

const CAPTURE_PATH: &str = "api/v1/payments/capture";

/// Capture payload. Identifier fields are duplicated under both the plain
/// and the gateway-prefixed spellings; different backend consumers read
/// different ones.
#[derive(Debug, Serialize)]
struct CapturePayload<'a> {
    user_id: &'a str,
    plan_id: &'a str,
    payment_id: &'a str,
    razorpay_payment_id: &'a str,
    order_id: &'a str,
    razorpay_order_id: &'a str,
    signature: &'a str,
    razorpay_signature: &'a str,
    method: String,
    method_details: &'a domain_types::types::PaymentMethodDetails,
    amount: MinorUnit,
    contact: &'a str,
    name: &'a str,
    email: &'a str,
    requires_alternative_verification: bool,
    /// The entire unprocessed checkout result, for backend audit and
    /// debugging of shapes this client failed to recognize.
    raw_log: RawLog<'a>,
}

#[derive(Debug, Serialize)]
struct RawLog<'a> {
    source: &'static str,
    checkout_response: &'a serde_json::Value,
}

pub struct BackendCaptureClient {
    base_url: String,
    bearer_token: Option<SecretString>,
}

impl BackendCaptureClient {
    pub fn new(base_url: String, bearer_token: Option<SecretString>) -> Self {
        Self {
            base_url,
            bearer_token,
        }
    }

    fn capture_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), CAPTURE_PATH)
    }
}

/// Route transport failures to the generic capture transport error. An
/// upstream timeout gets a louder note first: the backend may have captured
/// the payment even though the response never arrived, and reconciliation
/// will have to pick that up.
fn map_transport_error(error: Report<ApiClientError>) -> Report<UpgradeError> {
    if error.current_context().is_upstream_timeout() {
        tracing::warn!("capture request timed out; backend may still have captured");
    }
    error.change_context(UpgradeError::CaptureTransportError)
}

/// The capture endpoint's response envelope is itself inconsistent. Accept
/// any of: an explicit success flag, a numeric success code, or a
/// backend-assigned payment/subscription identifier.
fn interpret_capture_response(body: &serde_json::Value) -> CaptureResult {
    let success_flag = body
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let success_code = body
        .get("code")
        .and_then(serde_json::Value::as_i64)
        .map(|code| code == 1 || code == 200)
        .unwrap_or(false);
    let backend_payment_id = body
        .first_str(&["payment_id", "subscription_id", "id"])
        .or_else(|| {
            body.get("data")
                .and_then(|data| data.first_str(&["payment_id", "subscription_id", "id"]))
        });

    CaptureResult {
        accepted: success_flag || success_code || backend_payment_id.is_some(),
        backend_payment_id,
        message: body.first_str(&["message", "error"]),
    }
}

#[async_trait]
impl PaymentCapture for BackendCaptureClient {
    async fn capture(
        &self,
        payment: &NormalizedPayment,
        raw_result: &serde_json::Value,
        plan: &PlanOffer,
        user_id: &str,
    ) -> CustomResult<CaptureResult, UpgradeError> {
        let payload = CapturePayload {
            user_id,
            plan_id: &plan.id,
            payment_id: &payment.payment_id,
            razorpay_payment_id: &payment.payment_id,
            order_id: &payment.order_id,
            razorpay_order_id: &payment.order_id,
            signature: payment.signature.as_deref().unwrap_or(""),
            razorpay_signature: payment.signature.as_deref().unwrap_or(""),
            method: payment.method.to_string(),
            method_details: &payment.method_details,
            amount: payment.amount,
            contact: &payment.contact,
            name: &payment.name,
            email: &payment.email,
            requires_alternative_verification: payment.requires_alternative_verification,
            raw_log: RawLog {
                source: "hosted_checkout",
                checkout_response: raw_result,
            },
        };
        let payload =
            serde_json::to_value(&payload).change_context(UpgradeError::CaptureTransportError)?;

        let response = call_backend_api(
            Method::Post,
            &self.capture_url(),
            self.bearer_token.as_ref(),
            Some(payload),
        )
        .await
        .map_err(map_transport_error)?;

        let body: serde_json::Value = response
            .body
            .parse_struct("CaptureResponse")
            .unwrap_or_default();
        if !response.is_success() {
            return Err(report!(UpgradeError::CaptureRejected {
                message: body
                    .first_str(&["message", "error"])
                    .unwrap_or_else(|| format!("capture endpoint returned {}", response.status_code)),
            }));
        }

        let result = interpret_capture_response(&body);
        tracing::info!(
            accepted = result.accepted,
            payment_id = %payment.payment_id,
            "capture response interpreted"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_flag_is_enough() {
        let result = interpret_capture_response(&json!({ "success": true }));
        assert!(result.accepted);
        assert_eq!(result.backend_payment_id, None);
    }

    #[test]
    fn numeric_success_codes_are_accepted() {
        assert!(interpret_capture_response(&json!({ "code": 1 })).accepted);
        assert!(interpret_capture_response(&json!({ "code": 200 })).accepted);
        assert!(!interpret_capture_response(&json!({ "code": 0 })).accepted);
    }

    #[test]
    fn backend_assigned_id_is_enough() {
        let result =
            interpret_capture_response(&json!({ "data": { "subscription_id": "sub_9" } }));
        assert!(result.accepted);
        assert_eq!(result.backend_payment_id, Some("sub_9".to_string()));
    }

    #[test]
    fn transport_failures_map_to_the_capture_transport_error() {
        for transport in [
            ApiClientError::GatewayTimeoutReceived,
            ApiClientError::RequestTimeoutReceived,
            ApiClientError::BadGatewayReceived,
        ] {
            let mapped = map_transport_error(report!(transport));
            assert_eq!(
                mapped.current_context(),
                &UpgradeError::CaptureTransportError
            );
        }
    }

    #[test]
    fn plain_failure_envelope_is_rejected() {
        let result = interpret_capture_response(&json!({
            "success": false,
            "message": "signature mismatch",
        }));
        assert!(!result.accepted);
        assert_eq!(result.message, Some("signature mismatch".to_string()));
    }
}
