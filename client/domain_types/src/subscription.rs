use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Pending,
    Expired,
    Cancelled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Per-cycle usage against plan limits, as reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    #[serde(default)]
    pub customers: u32,
    #[serde(default)]
    pub entries: u32,
    #[serde(default)]
    pub reports: u32,
}

/// Best-known subscription state for the session. Owned by the caller's state
/// holder and refreshed by the reconciliation loop; may lag the backend
/// briefly after an upgrade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub plan_id: String,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub amount_major_units: i64,
    #[serde(default)]
    pub usage: UsageCounters,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub next_billing_date: Option<OffsetDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_backend_envelope() {
        let snapshot: SubscriptionSnapshot = serde_json::from_value(serde_json::json!({
            "plan_id": "2",
            "plan_name": "Starter",
            "status": "active",
            "amount_major_units": 999
        }))
        .expect("sparse snapshot should deserialize");
        assert_eq!(snapshot.status, SubscriptionStatus::Active);
        assert_eq!(snapshot.usage, UsageCounters::default());
        assert!(snapshot.next_billing_date.is_none());
    }

    #[test]
    fn unknown_status_strings_do_not_fail() {
        let status: SubscriptionStatus =
            serde_json::from_value(serde_json::json!("grace_period")).expect("tolerant status");
        assert_eq!(status, SubscriptionStatus::Unknown);
    }
}
