//! Shared domain-agnostic types.

use serde::{Deserialize, Serialize};

/// An amount in the smallest unit of its currency (paise for INR).
///
/// Plan prices arrive from the catalog in major units; everything sent to the
/// payment backend is minor units. Keeping the two in distinct types makes an
/// accidental 100x mistake a compile error.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, Hash,
)]
#[serde(transparent)]
pub struct MinorUnit(i64);

impl MinorUnit {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Convert a major-unit amount (e.g. rupees) into minor units.
    pub const fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    pub const fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_to_minor_conversion() {
        assert_eq!(MinorUnit::from_major(999).get_amount_as_i64(), 99_900);
        assert!(MinorUnit::from_major(0).is_zero());
    }

    #[test]
    fn serializes_transparently() {
        let amount = MinorUnit::new(99_900);
        assert_eq!(serde_json::json!(amount), serde_json::json!(99_900));
    }
}
