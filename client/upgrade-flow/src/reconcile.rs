//! Post-capture subscription reconciliation.
//!
//! The backend's plan change is not guaranteed to be visible immediately
//! after capture, so the holder is invalidated and refreshed in staggered
//! passes. Every pass is best-effort: the upgrade already succeeded at
//! capture time, so a failed refresh is logged and the next pass still runs.

use std::sync::Arc;
use std::time::Duration;

use domain_types::errors::ReconciliationError;
use interfaces::session::SubscriptionStateHolder;
use tokio::sync::watch;

/// One invalidate-and-refresh pass. Failures are logged, never returned.
/// Returns whether later passes should still run; a torn-down holder means
/// the session ended, so the rest of the chain is pointless.
pub async fn run_pass(holder: &dyn SubscriptionStateHolder, pass: usize) -> bool {
    holder.invalidate();
    match holder.refresh().await {
        Ok(snapshot) => {
            tracing::debug!(pass, plan_id = %snapshot.plan_id, status = %snapshot.status, "subscription refreshed");
            true
        }
        Err(error) => {
            if matches!(
                error.current_context(),
                ReconciliationError::HolderTornDown
            ) {
                tracing::debug!(pass, "state holder torn down, stopping reconciliation");
                return false;
            }
            tracing::warn!(pass, ?error, "reconciliation pass failed");
            true
        }
    }
}

/// Cancels the remaining scheduled passes when dropped. The whole chain goes
/// through one signal instead of per-timer cleanup.
#[derive(Debug)]
pub struct ReconciliationHandle {
    cancel_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl ReconciliationHandle {
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ReconciliationHandle {
    fn drop(&mut self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// Run the immediate pass, then schedule the remaining passes at the given
/// offsets from now. Passes execute sequentially on one task; there is never
/// a concurrent pair of refreshes racing to write the holder.
pub async fn reconcile(
    holder: Arc<dyn SubscriptionStateHolder>,
    delays: Vec<Duration>,
) -> ReconciliationHandle {
    let delays = if run_pass(holder.as_ref(), 0).await {
        delays
    } else {
        Vec::new()
    };
    schedule_passes(holder, delays)
}

fn schedule_passes(
    holder: Arc<dyn SubscriptionStateHolder>,
    delays: Vec<Duration>,
) -> ReconciliationHandle {
    let (cancel_tx, mut cancel_rx) = watch::channel(false);
    let start = tokio::time::Instant::now();
    let task = tokio::spawn(async move {
        for (index, delay) in delays.into_iter().enumerate() {
            let pass = index + 1;
            tokio::select! {
                _ = tokio::time::sleep_until(start + delay) => {
                    if !run_pass(holder.as_ref(), pass).await {
                        return;
                    }
                }
                _ = cancel_rx.changed() => {
                    tracing::debug!(pass, "reconciliation cancelled before pass");
                    return;
                }
            }
        }
    });
    ReconciliationHandle { cancel_tx, task }
}
