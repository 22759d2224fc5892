//! CIDR prefix wrapper
//!
//! Thin wrapper composing an [`ipnet::Ipv4Net`] and exposing the arithmetic
//! the resolver needs: a normalized literal and the usable host count. The
//! module also owns the private/special-range membership checks used to
//! filter addresses that must never reach the remote service.

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 routing prefix in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cidr(Ipv4Net);

impl Cidr {
    /// The prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.0.prefix_len()
    }

    /// The prefix with its network address truncated to the mask,
    /// e.g. `8.8.8.1/24` normalizes to `8.8.8.0/24`.
    pub fn normalized(&self) -> String {
        self.0.trunc().to_string()
    }

    /// Usable host addresses within the prefix.
    ///
    /// `2^(32-len) - 2` for ordinary prefixes; /31 counts both addresses
    /// (point-to-point) and /32 counts one.
    pub fn host_count(&self) -> u64 {
        let len = u32::from(self.0.prefix_len());
        let total = 1u64 << (32 - len);
        if len >= 31 {
            total
        } else {
            total - 2
        }
    }
}

impl FromStr for Cidr {
    type Err = ipnet::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Ipv4Net>().map(Cidr)
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Checks if an IP address is within private/internal ranges.
pub fn is_internal_ip(ip: &Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}

/// Checks if an IP is in the CGNAT range (100.64.0.0/10).
pub fn is_cgnat(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 100 && (64..=127).contains(&octets[1])
}

/// Checks whether an address must not be sent to the remote service.
///
/// Covers RFC1918, loopback, link-local, CGNAT, and the unspecified,
/// broadcast, and documentation blocks.
pub fn is_reserved_ip(ip: &Ipv4Addr) -> bool {
    is_internal_ip(ip)
        || is_cgnat(ip)
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
}
