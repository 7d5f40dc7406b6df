//! Response normalizer: deduces payment method and locates the transaction
//! signature inside the raw checkout result.
//!
//! The hosted checkout does not return a uniform shape. Keys differ by
//! payment method and between sandbox and live mode, the signature moves
//! between top-level and nested containers, and in some configurations it is
//! omitted entirely. Normalization is therefore an ordered sequence of
//! increasingly speculative lookups, and an absent signature is a valid
//! result (the backend then verifies by payment id + order id instead).

use common_utils::{
    consts::{SIGNATURE_CANDIDATE_MIN_LEN, SIGNATURE_SCAN_MAX_DEPTH, SIGNATURE_SCAN_MAX_NODES},
    ext_traits::ValueExt,
};
use domain_types::types::{
    NormalizedPayment, PaymentMethodDetails, PaymentMethodKind, PlanOffer, UserContext,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::checkout::{ORDER_ID_KEYS, PAYMENT_ID_KEYS};

const CARD_FIELDS: [&str; 4] = ["card_id", "card_network", "card_type", "card_last4"];
const UPI_FIELDS: [&str; 2] = ["upi_vpa", "upi_transaction_id"];

const SIGNATURE_KEY: &str = "razorpay_signature";
const SIGNATURE_ALTERNATES: [&str; 3] = ["signature", "rzp_signature", "payment_signature"];
/// Containers the SDK has been seen stuffing a "full response" into.
const NESTED_CONTAINERS: [&str; 4] = ["full_response", "log", "raw_response", "data"];

static HEX_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new("^[0-9a-fA-F]+$").expect("static hex pattern compiles")
});
static LIVE_ORDER_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new("^order_[A-Za-z0-9]{10,}$").expect("static order pattern compiles")
});

/// Knobs for the detection fallbacks. The live-order-id default-to-card rule
/// is observed sandbox-coverage behavior, not a business rule, so it can be
/// switched off.
#[derive(Debug, Clone, Copy)]
pub struct NormalizerOptions {
    pub assume_card_for_live_orders: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            assume_card_for_live_orders: true,
        }
    }
}

/// Build the fully-populated capture record from one raw checkout result.
/// Pure: same input, same output, no side effects.
pub fn normalize(raw: &Value, plan: &PlanOffer, user: &UserContext) -> NormalizedPayment {
    normalize_with_options(raw, plan, user, NormalizerOptions::default())
}

pub fn normalize_with_options(
    raw: &Value,
    plan: &PlanOffer,
    user: &UserContext,
    options: NormalizerOptions,
) -> NormalizedPayment {
    let payment_id = raw.first_str(&PAYMENT_ID_KEYS).unwrap_or_default();
    let order_id = raw.first_str(&ORDER_ID_KEYS).unwrap_or_default();
    let method = detect_method(raw, options);
    let signature = find_signature(raw);

    NormalizedPayment {
        payment_id,
        order_id,
        requires_alternative_verification: signature.is_none(),
        signature,
        method,
        method_details: extract_method_details(raw, method),
        amount: plan.price(),
        contact: raw.get_str("contact").unwrap_or_else(|| user.contact.clone()),
        name: raw.get_str("name").unwrap_or_else(|| user.name.clone()),
        email: raw.get_str("email").unwrap_or_else(|| user.email.clone()),
    }
}

/// Ordered method detection; first match wins.
fn detect_method(raw: &Value, options: NormalizerOptions) -> PaymentMethodKind {
    // An explicit method field is authoritative; an unrecognized value is
    // reported as unknown rather than second-guessed from other fields.
    if let Some(explicit) = raw.get_str("method") {
        return explicit
            .to_lowercase()
            .parse::<PaymentMethodKind>()
            .unwrap_or(PaymentMethodKind::Unknown);
    }
    if raw.get_str("bank").is_some() {
        return PaymentMethodKind::Netbanking;
    }
    if raw.get_str("wallet").is_some() {
        return PaymentMethodKind::Wallet;
    }
    let has_card_fields = CARD_FIELDS.iter().any(|key| raw.get_str(key).is_some());
    if has_card_fields {
        return PaymentMethodKind::Card;
    }
    if UPI_FIELDS.iter().any(|key| raw.get_str(key).is_some()) {
        return PaymentMethodKind::Upi;
    }

    // Fallback heuristics for results that carry no method hints at all.
    if raw.first_str(&PAYMENT_ID_KEYS).is_some() && !has_card_fields {
        return PaymentMethodKind::Upi;
    }
    if options.assume_card_for_live_orders {
        if let Some(order_id) = raw.first_str(&ORDER_ID_KEYS) {
            if LIVE_ORDER_RE.is_match(&order_id) {
                return PaymentMethodKind::Card;
            }
        }
    }
    PaymentMethodKind::Unknown
}

fn extract_method_details(raw: &Value, method: PaymentMethodKind) -> PaymentMethodDetails {
    match method {
        PaymentMethodKind::Card => PaymentMethodDetails::Card {
            card_id: raw.get_str("card_id").unwrap_or_default(),
            network: raw.get_str("card_network").unwrap_or_default(),
            card_type: raw.get_str("card_type").unwrap_or_default(),
            last4: raw.get_str("card_last4").unwrap_or_default(),
        },
        PaymentMethodKind::Upi => PaymentMethodDetails::Upi {
            vpa: raw
                .first_str(&["upi_vpa", "vpa"])
                .unwrap_or_default(),
            transaction_id: raw.get_str("upi_transaction_id").unwrap_or_default(),
        },
        PaymentMethodKind::Netbanking => PaymentMethodDetails::Netbanking {
            bank: raw.get_str("bank").unwrap_or_default(),
        },
        PaymentMethodKind::Wallet => PaymentMethodDetails::Wallet {
            provider: raw.get_str("wallet").unwrap_or_default(),
        },
        PaymentMethodKind::Unknown => PaymentMethodDetails::None,
    }
}

/// Ordered signature lookup: direct key, alternate spellings, known nested
/// containers (one and two levels deep), then a bounded scan of the whole
/// tree for anything that looks like a hex signature.
fn find_signature(raw: &Value) -> Option<String> {
    if let Some(signature) = raw.get_str(SIGNATURE_KEY) {
        return Some(signature);
    }
    if let Some(signature) = raw.first_str(&SIGNATURE_ALTERNATES) {
        return Some(signature);
    }
    for container_key in NESTED_CONTAINERS {
        let Some(container) = raw.get(container_key) else {
            continue;
        };
        if let Some(signature) = container.get_str(SIGNATURE_KEY) {
            return Some(signature);
        }
        if let Some(signature) = container.first_str(&SIGNATURE_ALTERNATES) {
            return Some(signature);
        }
        // Doubly-nested variant: a container inside a container.
        for inner_key in NESTED_CONTAINERS {
            if let Some(inner) = container.get(inner_key) {
                if let Some(signature) = inner
                    .get_str(SIGNATURE_KEY)
                    .or_else(|| inner.first_str(&SIGNATURE_ALTERNATES))
                {
                    return Some(signature);
                }
            }
        }
    }
    let mut budget = SIGNATURE_SCAN_MAX_NODES;
    scan_for_signature(raw, SIGNATURE_SCAN_MAX_DEPTH, &mut budget)
}

/// Last-resort walk over the whole result tree. Depth- and node-bounded so a
/// pathological payload cannot pin the UI thread.
fn scan_for_signature(value: &Value, depth_left: usize, budget: &mut usize) -> Option<String> {
    if depth_left == 0 || *budget == 0 {
        return None;
    }
    *budget -= 1;
    match value {
        Value::String(s) => {
            (s.len() > SIGNATURE_CANDIDATE_MIN_LEN && HEX_RE.is_match(s)).then(|| s.clone())
        }
        Value::Array(items) => items
            .iter()
            .find_map(|item| scan_for_signature(item, depth_left - 1, budget)),
        Value::Object(map) => map
            .values()
            .find_map(|item| scan_for_signature(item, depth_left - 1, budget)),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn starter_plan() -> PlanOffer {
        PlanOffer {
            id: "2".to_string(),
            name: "Starter".to_string(),
            price_major_units: 999,
            billing_period: "monthly".to_string(),
        }
    }

    fn test_user() -> UserContext {
        UserContext {
            user_id: "u1".to_string(),
            contact: "9999999999".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
        }
    }

    #[test]
    fn explicit_method_field_wins() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "method": "upi",
            "upi_vpa": "a@b",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Upi);
        assert_eq!(payment.signature, None);
        assert!(payment.requires_alternative_verification);
        assert_eq!(
            payment.method_details,
            PaymentMethodDetails::Upi {
                vpa: "a@b".to_string(),
                transaction_id: String::new(),
            }
        );
    }

    #[test]
    fn unrecognized_explicit_method_is_not_second_guessed() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "method": "emi",
            "card_last4": "1234",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Unknown);
        assert_eq!(payment.method_details, PaymentMethodDetails::None);
    }

    #[test]
    fn bank_field_means_netbanking() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "bank": "HDFC",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Netbanking);
        assert_eq!(
            payment.method_details,
            PaymentMethodDetails::Netbanking {
                bank: "HDFC".to_string()
            }
        );
    }

    #[test]
    fn card_last4_without_method_means_card() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "card_last4": "1234",
            "card_network": "visa",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Card);
        assert_eq!(
            payment.method_details,
            PaymentMethodDetails::Card {
                card_id: String::new(),
                network: "visa".to_string(),
                card_type: String::new(),
                last4: "1234".to_string(),
            }
        );
    }

    #[test]
    fn payment_id_without_hints_falls_back_to_upi() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Upi);
    }

    #[test]
    fn live_order_shape_defaults_to_card_unless_disabled() {
        let raw = json!({ "razorpay_order_id": "order_QMSVrXxHS9sBmu" });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Card);

        let payment = normalize_with_options(
            &raw,
            &starter_plan(),
            &test_user(),
            NormalizerOptions {
                assume_card_for_live_orders: false,
            },
        );
        assert_eq!(payment.method, PaymentMethodKind::Unknown);
        assert_eq!(payment.method_details, PaymentMethodDetails::None);
    }

    #[test]
    fn wallet_field_beats_card_fields() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "wallet": "paytm",
            "card_last4": "1234",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.method, PaymentMethodKind::Wallet);
    }

    #[test]
    fn direct_signature_is_found() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "ab12cd",
        });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.signature, Some("ab12cd".to_string()));
        assert!(!payment.requires_alternative_verification);
    }

    #[test]
    fn alternate_spellings_are_tried_in_order() {
        let raw = json!({ "payment_signature": "deadbeef" });
        assert_eq!(find_signature(&raw), Some("deadbeef".to_string()));
    }

    #[test]
    fn signature_found_in_doubly_nested_container() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "log": { "raw_response": { "signature": "feedface" } },
        });
        assert_eq!(find_signature(&raw), Some("feedface".to_string()));
    }

    #[test]
    fn recursive_scan_finds_hex_string_in_odd_location() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "meta": { "attempts": [ { "sig_candidate": "0123456789abcdef0123456789abcdef" } ] },
        });
        assert_eq!(
            find_signature(&raw),
            Some("0123456789abcdef0123456789abcdef".to_string())
        );
    }

    #[test]
    fn short_or_non_hex_strings_are_not_signatures() {
        let raw = json!({
            "meta": { "a": "0123456789abcdef0123", "b": "not-hex-but-quite-long-indeed" },
        });
        assert_eq!(find_signature(&raw), None);
    }

    #[test]
    fn scan_respects_depth_bound() {
        // Bury a candidate deeper than the walk is allowed to go.
        let mut value = json!("0123456789abcdef0123456789abcdef");
        for _ in 0..(SIGNATURE_SCAN_MAX_DEPTH + 2) {
            value = json!({ "next": value });
        }
        assert_eq!(find_signature(&value), None);
    }

    #[test]
    fn normalizer_is_idempotent() {
        let raw = json!({
            "razorpay_payment_id": "pay_1",
            "razorpay_order_id": "order_1",
            "method": "upi",
            "upi_vpa": "a@b",
        });
        let first = normalize(&raw, &starter_plan(), &test_user());
        let second = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(first, second);
    }

    #[test]
    fn sparse_fields_are_explicit_empties() {
        let raw = json!({ "razorpay_payment_id": "pay_1" });
        let payment = normalize(&raw, &starter_plan(), &test_user());
        assert_eq!(payment.order_id, "");
        assert_eq!(payment.contact, "9999999999");
        assert_eq!(payment.amount.get_amount_as_i64(), 99_900);
        let serialized = serde_json::to_value(&payment).expect("normalized payment serializes");
        assert!(serialized.get("order_id").is_some());
        assert!(serialized.get("signature").is_some());
    }
}
