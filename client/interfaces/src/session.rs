//! Session-scoped collaborators owned by the caller.

use async_trait::async_trait;
use common_utils::CustomResult;
use domain_types::{errors::ReconciliationError, subscription::SubscriptionSnapshot};

/// Holds the session's best-known subscription state. Replaces the old
/// module-level profile cache: one owned object, created at session start and
/// dropped on logout.
#[async_trait]
pub trait SubscriptionStateHolder: Send + Sync {
    /// Drop any cached subscription/profile reads so the next fetch hits the
    /// backend.
    fn invalidate(&self);

    /// Refetch authoritative state and store it as the new snapshot.
    async fn refresh(&self) -> CustomResult<SubscriptionSnapshot, ReconciliationError>;
}

/// The transaction-limit monitor that must not interrupt the UI while a
/// payment is on screen.
pub trait TransactionLimitMonitor: Send + Sync {
    fn pause(&self);
    fn resume(&self);
}
