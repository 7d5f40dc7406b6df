//! Upgrade workflow: sequences order creation, checkout, normalization,
//! capture, and reconciliation, with a single-flight guard and the
//! resume-on-all-paths contract for the transaction-limit monitor.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use common_utils::{
    consts::{CHECKOUT_ATTEMPT_TIMEOUT, MODAL_OPEN_WATCHDOG, RECONCILE_PASS_DELAYS},
    CustomResult,
};
use domain_types::{
    errors::UpgradeError,
    types::{CheckoutConfig, CheckoutOutcome, PlanOffer, UpgradeOutcome, UserContext},
};
use error_stack::report;
use interfaces::{
    checkout::HostedCheckoutProvider,
    session::{SubscriptionStateHolder, TransactionLimitMonitor},
    upgrade_types::{PaymentCapture, PaymentOrderCreate, PlanActivation},
};
use secrecy::SecretString;

use crate::{
    capture::BackendCaptureClient,
    checkout::open_checkout,
    config::Config,
    normalizer::{normalize_with_options, NormalizerOptions},
    order::BackendOrderClient,
    reconcile::{self, ReconciliationHandle},
    subscription::{CachedSubscriptionHolder, SubscriptionApiClient},
};

/// Where the current attempt is in its lifecycle. `Idle` both before the
/// first attempt and after every attempt ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum UpgradeStage {
    #[default]
    Idle,
    PendingOrder,
    AwaitingCheckout,
    Normalizing,
    Capturing,
    Reconciling,
}

/// External collaborators wired into the workflow.
pub struct Components {
    pub order_client: Arc<dyn PaymentOrderCreate>,
    pub capture_client: Arc<dyn PaymentCapture>,
    pub activation: Arc<dyn PlanActivation>,
    pub checkout_provider: Arc<dyn HostedCheckoutProvider>,
    pub state_holder: Arc<dyn SubscriptionStateHolder>,
    pub limit_monitor: Arc<dyn TransactionLimitMonitor>,
}

impl Components {
    /// Wire the backend-facing collaborators from configuration. The
    /// checkout provider and the limit monitor are platform-owned and come
    /// from the caller.
    pub fn from_config(
        config: &Config,
        bearer_token: Option<SecretString>,
        checkout_provider: Arc<dyn HostedCheckoutProvider>,
        limit_monitor: Arc<dyn TransactionLimitMonitor>,
    ) -> Self {
        let base_url = config.backend.base_url.clone();
        let subscription_client = Arc::new(SubscriptionApiClient::new(
            base_url.clone(),
            bearer_token.clone(),
        ));
        Self {
            order_client: Arc::new(BackendOrderClient::new(
                base_url.clone(),
                bearer_token.clone(),
            )),
            capture_client: Arc::new(BackendCaptureClient::new(base_url, bearer_token)),
            activation: subscription_client.clone(),
            checkout_provider,
            state_holder: Arc::new(CachedSubscriptionHolder::new(subscription_client)),
            limit_monitor,
        }
    }
}

pub struct UpgradeWorkflow {
    key_id: SecretString,
    display_name: String,
    components: Components,
    normalizer_options: NormalizerOptions,
    reconcile_delays: Vec<Duration>,
    attempt_timeout: Duration,
    modal_open_watchdog: Duration,
    in_flight: AtomicBool,
    stage: Mutex<UpgradeStage>,
    reconciliation: Mutex<Option<ReconciliationHandle>>,
}

/// Releases the single-flight slot and returns the stage to `Idle`, on every
/// exit path.
struct FlightGuard<'a> {
    workflow: &'a UpgradeWorkflow,
}

impl<'a> FlightGuard<'a> {
    fn acquire(workflow: &'a UpgradeWorkflow) -> CustomResult<Self, UpgradeError> {
        workflow
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| report!(UpgradeError::AlreadyInProgress))?;
        Ok(Self { workflow })
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.workflow.set_stage(UpgradeStage::Idle);
        self.workflow.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Resumes the transaction-limit monitor when dropped. Success, cancellation,
/// and every error path all unwind through here exactly once.
struct MonitorPauseGuard<'a> {
    monitor: &'a dyn TransactionLimitMonitor,
}

impl<'a> MonitorPauseGuard<'a> {
    fn pause(monitor: &'a dyn TransactionLimitMonitor) -> Self {
        monitor.pause();
        Self { monitor }
    }
}

impl Drop for MonitorPauseGuard<'_> {
    fn drop(&mut self) {
        self.monitor.resume();
    }
}

impl UpgradeWorkflow {
    pub fn new(key_id: SecretString, display_name: String, components: Components) -> Self {
        Self {
            key_id,
            display_name,
            components,
            normalizer_options: NormalizerOptions::default(),
            reconcile_delays: RECONCILE_PASS_DELAYS.to_vec(),
            attempt_timeout: CHECKOUT_ATTEMPT_TIMEOUT,
            modal_open_watchdog: MODAL_OPEN_WATCHDOG,
            in_flight: AtomicBool::new(false),
            stage: Mutex::new(UpgradeStage::Idle),
            reconciliation: Mutex::new(None),
        }
    }

    /// Build the workflow from the application configuration's checkout
    /// section (key, display name, timeout overrides).
    pub fn from_config(config: &Config, components: Components) -> Self {
        let mut workflow = Self::new(
            config.checkout.key_id(),
            config.checkout.display_name.clone(),
            components,
        );
        workflow.attempt_timeout = config.checkout.attempt_timeout();
        workflow.modal_open_watchdog = config.checkout.modal_open_watchdog();
        workflow
    }

    pub fn with_normalizer_options(mut self, options: NormalizerOptions) -> Self {
        self.normalizer_options = options;
        self
    }

    pub fn stage(&self) -> UpgradeStage {
        self.stage
            .lock()
            .map(|guard| *guard)
            .unwrap_or(UpgradeStage::Idle)
    }

    fn set_stage(&self, stage: UpgradeStage) {
        tracing::debug!(stage = %stage, "upgrade stage");
        if let Ok(mut guard) = self.stage.lock() {
            *guard = stage;
        }
    }

    /// Run one upgrade attempt end to end.
    ///
    /// Rejected with `AlreadyInProgress` while another attempt is anywhere
    /// between order creation and reconciliation start. Cancellation by the
    /// user is an `Ok` outcome; every other failure carries a fixed
    /// user-facing message via [`UpgradeError::user_message`].
    pub async fn upgrade(
        &self,
        plan: PlanOffer,
        user: UserContext,
    ) -> CustomResult<UpgradeOutcome, UpgradeError> {
        let flight = FlightGuard::acquire(self)?;
        let _monitor = MonitorPauseGuard::pause(self.components.limit_monitor.as_ref());

        let result = self.run_attempt(&plan, &user).await;
        drop(flight);

        match result {
            Ok(outcome) => {
                tracing::info!(plan_id = %plan.id, ?outcome, "upgrade attempt finished");
                Ok(outcome)
            }
            Err(error) => {
                // Dismissal is informational, never an error-level event.
                if let UpgradeError::UserCancelled { reason } = error.current_context() {
                    tracing::info!(plan_id = %plan.id, "upgrade cancelled by user");
                    return Ok(UpgradeOutcome::Cancelled {
                        reason: reason.clone(),
                    });
                }
                tracing::error!(
                    plan_id = %plan.id,
                    user_message = error.current_context().user_message(),
                    ?error,
                    "upgrade attempt failed"
                );
                Err(error)
            }
        }
    }

    async fn run_attempt(
        &self,
        plan: &PlanOffer,
        user: &UserContext,
    ) -> CustomResult<UpgradeOutcome, UpgradeError> {
        if plan.is_free() {
            return self.activate_free(plan, user).await;
        }

        self.set_stage(UpgradeStage::PendingOrder);
        let order = self
            .components
            .order_client
            .create_order(plan, user)
            .await?;

        self.set_stage(UpgradeStage::AwaitingCheckout);
        let mut config = CheckoutConfig::new(self.key_id.clone(), &order, user);
        config.display_name = self.display_name.clone();
        config.attempt_timeout = self.attempt_timeout;
        config.modal_open_watchdog = self.modal_open_watchdog;
        let outcome = open_checkout(self.components.checkout_provider.as_ref(), &config).await?;

        let raw_result = match outcome {
            CheckoutOutcome::Cancelled { reason } => {
                return Err(report!(UpgradeError::UserCancelled { reason }));
            }
            CheckoutOutcome::Failed { code, message } => {
                return Err(report!(UpgradeError::SdkError { code, message }));
            }
            CheckoutOutcome::Completed { raw_result } => raw_result,
        };

        self.set_stage(UpgradeStage::Normalizing);
        let normalized =
            normalize_with_options(&raw_result, plan, user, self.normalizer_options);

        self.set_stage(UpgradeStage::Capturing);
        let capture = self
            .components
            .capture_client
            .capture(&normalized, &raw_result, plan, &user.user_id)
            .await?;
        if !capture.accepted {
            return Err(report!(UpgradeError::CaptureRejected {
                message: capture
                    .message
                    .unwrap_or_else(|| "capture not accepted".to_string()),
            }));
        }

        self.set_stage(UpgradeStage::Reconciling);
        self.start_reconciliation().await;

        Ok(UpgradeOutcome::Upgraded {
            plan: plan.clone(),
            backend_payment_id: capture.backend_payment_id,
        })
    }

    /// Zero-price plans never touch order creation or checkout; the backend
    /// activates the plan directly and state is reconciled the same way.
    async fn activate_free(
        &self,
        plan: &PlanOffer,
        user: &UserContext,
    ) -> CustomResult<UpgradeOutcome, UpgradeError> {
        self.set_stage(UpgradeStage::Reconciling);
        self.components
            .activation
            .activate_plan(plan, &user.user_id)
            .await?;
        self.start_reconciliation().await;
        Ok(UpgradeOutcome::ActivatedFree { plan: plan.clone() })
    }

    /// Runs the immediate pass inline, then parks the scheduled chain's
    /// handle on the workflow so a newer attempt (or workflow teardown)
    /// cancels any passes still pending.
    async fn start_reconciliation(&self) {
        let handle = reconcile::reconcile(
            self.components.state_holder.clone(),
            self.reconcile_delays.clone(),
        )
        .await;
        if let Ok(mut slot) = self.reconciliation.lock() {
            *slot = Some(handle);
        }
    }
}

impl Drop for UpgradeWorkflow {
    fn drop(&mut self) {
        // Session teardown: kill any pending reconciliation passes rather
        // than letting them write into a dead state holder.
        if let Ok(mut slot) = self.reconciliation.lock() {
            if let Some(handle) = slot.take() {
                handle.cancel();
            }
        }
    }
}
