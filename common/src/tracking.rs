use std::fmt;

use serde::{Deserialize, Serialize};

/// Branch whose shipments get the `TOP` prefix. Every other branch uses `BRA`.
pub const TOPEKA_BRANCH: &str = "topeka";

/// Number of trailing millisecond digits kept in a tracking code.
pub const SUFFIX_DIGITS: u32 = 8;

/// Public, customer-facing shipment identifier, e.g. `BRA38104512`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingCode(pub String);

impl TrackingCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Three-letter prefix for a branch code.
pub fn branch_prefix(branch: &str) -> &'static str {
    if branch == TOPEKA_BRANCH {
        "TOP"
    } else {
        "BRA"
    }
}

/// Branch prefix followed by the last eight digits of `unix_millis`.
///
/// Two shipments created in the same millisecond on the same branch collide;
/// callers that need uniqueness must probe and retry with a later instant.
pub fn generate(branch: &str, unix_millis: i64) -> TrackingCode {
    let modulus = 10_i64.pow(SUFFIX_DIGITS);
    let suffix = unix_millis.rem_euclid(modulus);
    TrackingCode(format!(
        "{}{:0width$}",
        branch_prefix(branch),
        suffix,
        width = SUFFIX_DIGITS as usize
    ))
}

/// Source of the current Unix time in milliseconds.
pub trait TrackingClock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc::now()`.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl TrackingClock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
