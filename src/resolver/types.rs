//! Typed records produced by the resolution engine

use crate::cidr::Cidr;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Reason attached to identifiers that fail aut-num validation.
pub const INVALID_AUT_NUM: &str = "invalid aut-num";

/// Success-partition entry for an ASN lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsnRecord {
    /// The ASN is allocated to an organization
    Resolved {
        /// The queried AS number
        as_number: u64,
        /// Organization name
        organization: String,
        /// Two-letter country code
        country_code: String,
    },
    /// The ASN is in a valid numeric range but not currently allocated
    Unallocated {
        /// The queried AS number
        as_number: u64,
    },
}

impl AsnRecord {
    /// The AS number this record answers for.
    pub fn as_number(&self) -> u64 {
        match self {
            AsnRecord::Resolved { as_number, .. } | AsnRecord::Unallocated { as_number } => {
                *as_number
            }
        }
    }
}

/// Error-partition entry for an identifier that failed validation.
/// Never sent to the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidAsn {
    /// The identifier as the caller supplied it
    pub identifier: String,
    /// Always [`INVALID_AUT_NUM`]
    pub reason: String,
}

impl InvalidAsn {
    /// Build the standard invalid-aut-num entry for an identifier.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            reason: INVALID_AUT_NUM.to_string(),
        }
    }
}

/// Success-partition entry for an IP lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CidrRecord {
    /// Announced routing prefix as the server reported it
    pub prefix: Cidr,
    /// Prefix with the network address truncated to the mask
    pub normalized: String,
    /// Usable host addresses within the prefix
    pub host_count: u64,
    /// Originating AS number, as the server printed it
    pub asn: String,
    /// Two-letter country code
    pub country_code: String,
    /// Organization name
    pub organization: String,
}

/// Error-partition entry for an address that never reached the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpLookupError {
    /// The address as the caller supplied it
    pub address: String,
    /// Why it was filtered out
    pub reason: String,
}

/// Success/error-partitioned outcome of one resolution call.
///
/// The partitions are disjoint and together cover every input exactly
/// once; ordering within each partition matches input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResult<S, E> {
    /// Records for inputs the remote service answered
    pub success: Vec<S>,
    /// Inputs filtered out before the exchange
    pub error: Vec<E>,
}

/// Aggregate of an ASN batch resolution.
pub type AsnResolution = AggregateResult<AsnRecord, InvalidAsn>;

/// Aggregate of an IP bulk resolution.
pub type IpResolution = AggregateResult<CidrRecord, IpLookupError>;

impl AggregateResult<AsnRecord, InvalidAsn> {
    /// Render the success partition as CSV with the legacy column order
    /// (`description`, `aut-num`, `country`).
    pub fn to_csv(&self) -> String {
        let mut out = String::from("\"AS_description\",\"AS_aut-num\",\"AS_country\"\n");
        for record in &self.success {
            match record {
                AsnRecord::Resolved {
                    as_number,
                    organization,
                    country_code,
                } => {
                    let _ = writeln!(out, "\"{organization}\",\"{as_number}\",\"{country_code}\"");
                }
                AsnRecord::Unallocated { as_number } => {
                    let _ = writeln!(out, "\"\",\"{as_number}\",\"\"");
                }
            }
        }
        out
    }
}
