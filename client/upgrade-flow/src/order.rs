//! Order service client: creates the pending backend order an upgrade
//! attempt pays against.

use async_trait::async_trait;
use common_utils::{
    ext_traits::{ByteSliceExt, OptionExt, ValueExt},
    fp_utils::{self, generate_receipt_id},
    types::MinorUnit,
    CustomResult,
};
use domain_types::{
    errors::UpgradeError,
    types::{OrderReference, PlanOffer, UserContext},
};
use error_stack::{report, ResultExt};
use interfaces::upgrade_types::PaymentOrderCreate;
use secrecy::SecretString;
use serde::Serialize;

use crate::api_client::{call_backend_api, Method};

const ORDER_PATH: &str = "api/v1/payments/orders";
const DEFAULT_CURRENCY: &str = "INR";

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    user_id: &'a str,
    plan_id: &'a str,
    amount: MinorUnit,
    currency: &'a str,
    receipt: String,
    notes: serde_json::Value,
    contact: &'a str,
    name: &'a str,
}

pub struct BackendOrderClient {
    base_url: String,
    bearer_token: Option<SecretString>,
}

impl BackendOrderClient {
    pub fn new(base_url: String, bearer_token: Option<SecretString>) -> Self {
        Self {
            base_url,
            bearer_token,
        }
    }

    fn order_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), ORDER_PATH)
    }
}

/// The backend wraps the created order inconsistently across deployments;
/// accept every shape seen in the wild before giving up.
fn extract_order_id(body: &serde_json::Value) -> Option<String> {
    body.first_str(&["order_id", "id"])
        .or_else(|| body.get("data").and_then(|d| d.first_str(&["order_id", "id"])))
        .or_else(|| body.get_nested_str("order", "id"))
}

#[async_trait]
impl PaymentOrderCreate for BackendOrderClient {
    async fn create_order(
        &self,
        plan: &PlanOffer,
        user: &UserContext,
    ) -> CustomResult<OrderReference, UpgradeError> {
        let amount = plan.price();
        fp_utils::when(amount.get_amount_as_i64() <= 0, || {
            Err(report!(UpgradeError::OrderCreationFailed {
                message: format!("non-positive amount for plan {}", plan.id),
            }))
        })?;

        let request = CreateOrderRequest {
            user_id: &user.user_id,
            plan_id: &plan.id,
            amount,
            currency: DEFAULT_CURRENCY,
            receipt: generate_receipt_id(),
            notes: serde_json::json!({
                "plan_name": plan.name,
                "billing_period": plan.billing_period,
            }),
            contact: &user.contact,
            name: &user.name,
        };
        let payload = serde_json::to_value(&request).change_context(
            UpgradeError::OrderCreationFailed {
                message: "order request serialization failed".to_string(),
            },
        )?;

        let response = call_backend_api(
            Method::Post,
            &self.order_url(),
            self.bearer_token.as_ref(),
            Some(payload),
        )
        .await
        .map_err(|error| {
            let message = error.current_context().to_string();
            error.change_context(UpgradeError::OrderCreationFailed { message })
        })?;

        if !response.is_success() {
            return Err(report!(UpgradeError::OrderCreationFailed {
                message: format!("order endpoint returned {}", response.status_code),
            }));
        }

        let body: serde_json::Value = response
            .body
            .parse_struct("CreateOrderResponse")
            .change_context(UpgradeError::OrderCreationFailed {
                message: "order response was not JSON".to_string(),
            })?;
        let order_id = extract_order_id(&body)
            .get_required_value("order_id")
            .change_context(UpgradeError::OrderCreationFailed {
                message: "no order id in response".to_string(),
            })?;

        tracing::info!(order_id = %order_id, plan_id = %plan.id, "order created");
        Ok(OrderReference {
            order_id,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn order_id_found_in_every_known_envelope() {
        let shapes = [
            json!({ "order_id": "order_abc" }),
            json!({ "id": "order_abc" }),
            json!({ "data": { "order_id": "order_abc" } }),
            json!({ "data": { "id": "order_abc" } }),
            json!({ "order": { "id": "order_abc" } }),
        ];
        for shape in shapes {
            assert_eq!(extract_order_id(&shape), Some("order_abc".to_string()));
        }
    }

    #[test]
    fn unknown_envelope_yields_none() {
        assert_eq!(extract_order_id(&json!({ "status": "created" })), None);
    }
}
