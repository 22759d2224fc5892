//! Aut-num validation
//!
//! Registry-reserved-number policy: the 16-bit space (1..=65535) and the
//! 32-bit space above the reserved 65536..=131071 band, capped below
//! 5_000_000_000. Validity is a derived property of a candidate, never an
//! invariant of construction.

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of the 16-bit ASN space
const ASN16_END: u64 = 65_536;
/// Last reserved number between the 16-bit and 32-bit spaces
const ASN32_RESERVED_END: u64 = 131_071;
/// Upper bound (exclusive) of the accepted 32-bit space
const ASN32_END: u64 = 5_000_000_000;

/// Checks whether an integer is an allocatable AS number.
///
/// True iff `0 < n < 65536` or `131071 < n < 5000000000`. The band
/// 65536..=131071 is registry-reserved and invalid, as are zero and
/// anything at or above five billion.
pub fn is_valid_as_number(n: u64) -> bool {
    (n > 0 && n < ASN16_END) || (n > ASN32_RESERVED_END && n < ASN32_END)
}

/// The result of validating one caller-supplied identifier.
///
/// Keeps the original string form so malformed input can be echoed back
/// verbatim in the error partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    /// The identifier as the caller supplied it
    pub identifier: String,
    /// Parsed numeric value, present only when integer coercion succeeded
    pub as_number: Option<u64>,
    /// Whether the identifier is an allocatable AS number
    pub valid: bool,
}

/// Validate a single candidate identifier.
///
/// Strings that fail integer coercion are invalid, not errors.
pub fn validate_candidate(raw: &str) -> ValidationOutcome {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(n) => ValidationOutcome {
            identifier: trimmed.to_string(),
            as_number: Some(n),
            valid: is_valid_as_number(n),
        },
        Err(_) => ValidationOutcome {
            identifier: trimmed.to_string(),
            as_number: None,
            valid: false,
        },
    }
}
