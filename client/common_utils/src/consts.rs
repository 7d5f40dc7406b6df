//! Consolidated constants for the upgrade client

use std::time::Duration;

// =============================================================================
// ID Generation and Length Constants
// =============================================================================

pub const ID_LENGTH: usize = 20;

/// Characters to use for generating NanoID
pub(crate) const ALPHABETS: [char; 62] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
    'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

/// Prefix for order receipt identifiers sent to the backend
pub const RECEIPT_PREFIX: &str = "rcpt";

// =============================================================================
// Checkout Timing
// =============================================================================

/// Upper bound on a full hosted-checkout attempt
pub const CHECKOUT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(300);
/// The hosted UI must signal that it opened within this window
pub const MODAL_OPEN_WATCHDOG: Duration = Duration::from_secs(8);

/// Delays for the post-capture reconciliation passes, relative to capture time
pub const RECONCILE_PASS_DELAYS: [Duration; 3] = [
    Duration::from_millis(1_000),
    Duration::from_millis(2_500),
    Duration::from_millis(4_000),
];

// =============================================================================
// Signature Scan Bounds
// =============================================================================

/// Minimum length for a string to qualify as a signature candidate
pub const SIGNATURE_CANDIDATE_MIN_LEN: usize = 20;
/// Maximum nesting depth the signature scan will descend into
pub const SIGNATURE_SCAN_MAX_DEPTH: usize = 8;
/// Maximum number of nodes the signature scan will visit
pub const SIGNATURE_SCAN_MAX_NODES: usize = 512;

// =============================================================================
// HTTP Headers
// =============================================================================

/// Header key for the app platform (always "mobile" for this client)
pub const X_CLIENT_PLATFORM: &str = "x-client-platform";

// =============================================================================
// Error Messages and Codes
// =============================================================================

/// No error message string const
pub const NO_ERROR_MESSAGE: &str = "No error message";
/// No error code string const
pub const NO_ERROR_CODE: &str = "No error code";

// =============================================================================
// Environment and Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Development,
    Release,
}

impl Env {
    pub const fn current_env() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Release
        }
    }

    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Release => "production.toml",
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Release => write!(f, "release"),
        }
    }
}
