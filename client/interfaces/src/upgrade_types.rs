//! Backend-facing operations of the upgrade flow.

use async_trait::async_trait;
use common_utils::CustomResult;
use domain_types::{
    errors::UpgradeError,
    types::{CaptureResult, NormalizedPayment, OrderReference, PlanOffer, UserContext},
};

/// Creates the pending order the checkout attempt will pay against.
#[async_trait]
pub trait PaymentOrderCreate: Send + Sync {
    async fn create_order(
        &self,
        plan: &PlanOffer,
        user: &UserContext,
    ) -> CustomResult<OrderReference, UpgradeError>;
}

/// Submits the normalized attributes plus the verbatim checkout result for
/// authoritative capture and server-side signature verification.
#[async_trait]
pub trait PaymentCapture: Send + Sync {
    async fn capture(
        &self,
        payment: &NormalizedPayment,
        raw_result: &serde_json::Value,
        plan: &PlanOffer,
        user_id: &str,
    ) -> CustomResult<CaptureResult, UpgradeError>;
}

/// Direct plan activation, used only for zero-price plans where no payment
/// is involved.
#[async_trait]
pub trait PlanActivation: Send + Sync {
    async fn activate_plan(&self, plan: &PlanOffer, user_id: &str)
        -> CustomResult<(), UpgradeError>;
}
