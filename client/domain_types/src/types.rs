use std::time::Duration;

use common_utils::{
    consts::{CHECKOUT_ATTEMPT_TIMEOUT, MODAL_OPEN_WATCHDOG},
    types::MinorUnit,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// An upgrade target from the plan catalog. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOffer {
    pub id: String,
    pub name: String,
    pub price_major_units: i64,
    pub billing_period: String,
}

impl PlanOffer {
    pub fn price(&self) -> MinorUnit {
        MinorUnit::from_major(self.price_major_units)
    }

    /// Free plans never touch the payment backend.
    pub fn is_free(&self) -> bool {
        self.price().is_zero()
    }
}

/// The pending order created server-side before checkout opens. One per
/// attempt; discarded once the attempt ends either way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReference {
    pub order_id: String,
    pub amount: MinorUnit,
    pub currency: String,
}

/// Current user identity fields prefilled into checkout and echoed to the
/// capture endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserContext {
    pub user_id: String,
    pub contact: String,
    pub name: String,
    pub email: String,
}

/// Payment method allow-list passed to the hosted checkout. EMI and pay-later
/// are disabled for subscription upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MethodAllowList {
    pub card: bool,
    pub upi: bool,
    pub netbanking: bool,
    pub wallet: bool,
    pub emi: bool,
    pub paylater: bool,
}

impl Default for MethodAllowList {
    fn default() -> Self {
        Self {
            card: true,
            upi: true,
            netbanking: true,
            wallet: true,
            emi: false,
            paylater: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutTheme {
    pub color: String,
}

impl Default for CheckoutTheme {
    fn default() -> Self {
        Self {
            color: "#1a73e8".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckoutPrefill {
    pub contact: String,
    pub email: String,
    pub name: String,
}

/// Everything the hosted checkout needs for one attempt.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub key_id: SecretString,
    pub order_id: String,
    pub amount: MinorUnit,
    pub currency: String,
    pub display_name: String,
    pub prefill: CheckoutPrefill,
    pub method: MethodAllowList,
    pub theme: CheckoutTheme,
    pub attempt_timeout: Duration,
    pub modal_open_watchdog: Duration,
}

impl CheckoutConfig {
    pub fn new(key_id: SecretString, order: &OrderReference, user: &UserContext) -> Self {
        Self {
            key_id,
            order_id: order.order_id.clone(),
            amount: order.amount,
            currency: order.currency.clone(),
            display_name: String::new(),
            prefill: CheckoutPrefill {
                contact: user.contact.clone(),
                email: user.email.clone(),
                name: user.name.clone(),
            },
            method: MethodAllowList::default(),
            theme: CheckoutTheme::default(),
            attempt_timeout: CHECKOUT_ATTEMPT_TIMEOUT,
            modal_open_watchdog: MODAL_OPEN_WATCHDOG,
        }
    }
}

/// What one hosted-checkout attempt resolved to. Consumed immediately by the
/// normalizer; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Completed { raw_result: serde_json::Value },
    Cancelled { reason: String },
    Failed { code: String, message: String },
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentMethodKind {
    Card,
    Upi,
    Netbanking,
    Wallet,
    Unknown,
}

/// Instrument details pulled out of the raw checkout result, keyed by method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethodDetails {
    Card {
        card_id: String,
        network: String,
        card_type: String,
        last4: String,
    },
    Upi {
        vpa: String,
        transaction_id: String,
    },
    Netbanking {
        bank: String,
    },
    Wallet {
        provider: String,
    },
    None,
}

/// The fully-populated record handed to the capture endpoint. Sparse fields
/// are explicit empties, never omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedPayment {
    pub payment_id: String,
    pub order_id: String,
    pub signature: Option<String>,
    pub method: PaymentMethodKind,
    pub method_details: PaymentMethodDetails,
    pub amount: MinorUnit,
    pub contact: String,
    pub name: String,
    pub email: String,
    /// Set when no signature could be located anywhere in the raw result;
    /// tells the backend to verify by payment id + order id instead.
    pub requires_alternative_verification: bool,
}

/// Terminal result of the capture call.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub accepted: bool,
    pub backend_payment_id: Option<String>,
    pub message: Option<String>,
}

/// How a finished upgrade attempt is reported to the caller. Cancellation is
/// a regular outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum UpgradeOutcome {
    Upgraded {
        plan: PlanOffer,
        backend_payment_id: Option<String>,
    },
    ActivatedFree {
        plan: PlanOffer,
    },
    Cancelled {
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_price_converts_to_minor_units() {
        let plan = PlanOffer {
            id: "2".to_string(),
            name: "Starter".to_string(),
            price_major_units: 999,
            billing_period: "monthly".to_string(),
        };
        assert_eq!(plan.price().get_amount_as_i64(), 99_900);
        assert!(!plan.is_free());
    }

    #[test]
    fn zero_price_plan_is_free() {
        let plan = PlanOffer {
            id: "1".to_string(),
            name: "Basic".to_string(),
            price_major_units: 0,
            billing_period: "monthly".to_string(),
        };
        assert!(plan.is_free());
    }

    #[test]
    fn allow_list_disables_credit_products_by_default() {
        let methods = MethodAllowList::default();
        assert!(methods.card && methods.upi && methods.netbanking && methods.wallet);
        assert!(!methods.emi && !methods.paylater);
    }

    #[test]
    fn method_kind_round_trips_through_strings() {
        use std::str::FromStr;
        assert_eq!(PaymentMethodKind::Card.to_string(), "card");
        assert_eq!(
            PaymentMethodKind::from_str("netbanking").ok(),
            Some(PaymentMethodKind::Netbanking)
        );
    }
}
