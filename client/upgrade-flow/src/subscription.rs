//! Subscription endpoints: fetch current state, activate a plan directly
//! (free upgrades), and the session-owned cached state holder.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common_utils::{
    ext_traits::{ByteSliceExt, ValueExt},
    CustomResult,
};
use domain_types::{
    errors::{ReconciliationError, UpgradeError},
    subscription::SubscriptionSnapshot,
    types::PlanOffer,
};
use error_stack::{report, ResultExt};
use interfaces::{session::SubscriptionStateHolder, upgrade_types::PlanActivation};
use secrecy::SecretString;

use crate::api_client::{call_backend_api, Method};

const SUBSCRIPTION_PATH: &str = "api/v1/subscriptions/current";
const ACTIVATE_PATH: &str = "api/v1/subscriptions";

pub struct SubscriptionApiClient {
    base_url: String,
    bearer_token: Option<SecretString>,
}

impl SubscriptionApiClient {
    pub fn new(base_url: String, bearer_token: Option<SecretString>) -> Self {
        Self {
            base_url,
            bearer_token,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// GET the authoritative subscription state, unwrapping whichever
    /// envelope the backend chose.
    pub async fn fetch_subscription(
        &self,
    ) -> CustomResult<SubscriptionSnapshot, ReconciliationError> {
        let response = call_backend_api(
            Method::Get,
            &self.url(SUBSCRIPTION_PATH),
            self.bearer_token.as_ref(),
            None,
        )
        .await
        .map_err(|error| {
            let message = error.current_context().to_string();
            error.change_context(ReconciliationError::RefreshFailed(message))
        })?;

        if !response.is_success() {
            return Err(report!(ReconciliationError::RefreshFailed(format!(
                "subscription endpoint returned {}",
                response.status_code
            ))));
        }

        let body: serde_json::Value = response
            .body
            .parse_struct("SubscriptionResponse")
            .change_context(ReconciliationError::RefreshFailed(
                "subscription response was not JSON".to_string(),
            ))?;
        let envelope = body
            .get("data")
            .or_else(|| body.get("subscription"))
            .unwrap_or(&body);
        envelope
            .clone()
            .parse_value("SubscriptionSnapshot")
            .change_context(ReconciliationError::RefreshFailed(
                "unrecognized subscription envelope".to_string(),
            ))
    }
}

#[async_trait]
impl PlanActivation for SubscriptionApiClient {
    async fn activate_plan(
        &self,
        plan: &PlanOffer,
        user_id: &str,
    ) -> CustomResult<(), UpgradeError> {
        let payload = serde_json::json!({
            "user_id": user_id,
            "plan_id": plan.id,
        });
        let response = call_backend_api(
            Method::Post,
            &self.url(ACTIVATE_PATH),
            self.bearer_token.as_ref(),
            Some(payload),
        )
        .await
        .map_err(|error| {
            let message = error.current_context().to_string();
            error.change_context(UpgradeError::ActivationFailed { message })
        })?;

        if !response.is_success() {
            let body: serde_json::Value =
                serde_json::from_slice(&response.body).unwrap_or_default();
            return Err(report!(UpgradeError::ActivationFailed {
                message: body
                    .first_str(&["message", "error"])
                    .unwrap_or_else(|| format!("activation returned {}", response.status_code)),
            }));
        }
        tracing::info!(plan_id = %plan.id, "plan activated without payment");
        Ok(())
    }
}

/// Session-owned subscription cache. One per login; invalidation clears the
/// snapshot so the next read goes to the backend.
pub struct CachedSubscriptionHolder {
    client: Arc<SubscriptionApiClient>,
    cached: Mutex<Option<SubscriptionSnapshot>>,
}

impl CachedSubscriptionHolder {
    pub fn new(client: Arc<SubscriptionApiClient>) -> Self {
        Self {
            client,
            cached: Mutex::new(None),
        }
    }

    /// Last refreshed snapshot, if any. May be briefly stale after an
    /// upgrade until reconciliation completes.
    pub fn current(&self) -> Option<SubscriptionSnapshot> {
        self.cached.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl SubscriptionStateHolder for CachedSubscriptionHolder {
    fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }

    async fn refresh(&self) -> CustomResult<SubscriptionSnapshot, ReconciliationError> {
        let snapshot = self.client.fetch_subscription().await?;
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(snapshot.clone());
        }
        Ok(snapshot)
    }
}
