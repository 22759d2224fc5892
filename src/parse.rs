//! Bulk WHOIS response parsing
//!
//! The service replies with one column-header line, one data line per
//! request line, and a trailing empty line from the final CRLF. Two
//! dialects exist: the ASN batch reply is comma-delimited, the IP bulk
//! ("verbose") reply is pipe-delimited. Replies carry no identifier
//! matching guarantee beyond position, so the i-th data line maps to the
//! i-th request line; callers zip the two positionally.

use crate::cidr::Cidr;
use thiserror::Error;

/// Errors produced while parsing a raw response.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The remote returned no parseable data lines. A protocol contract
    /// violation, never an empty success set.
    #[error("remote returned no parseable response lines")]
    MalformedResponse,

    /// A verbose-dialect line was missing required fields
    #[error("malformed response line: {line:?}")]
    MalformedLine {
        /// The offending line, verbatim
        line: String,
    },
}

/// One parsed line of the comma-delimited ASN dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsnReply {
    /// The ASN is allocated to an organization
    Allocated {
        /// Organization name extracted from the description fields
        organization: String,
        /// Two-letter country code
        country_code: String,
    },
    /// The line carried no country-code field: the ASN is numerically
    /// valid but not currently allocated
    Unallocated,
}

/// One parsed line of the pipe-delimited verbose dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpReply {
    /// Originating AS number, as the server printed it
    pub asn: String,
    /// Announced routing prefix
    pub cidr: Cidr,
    /// Two-letter country code
    pub country_code: String,
    /// Regional Internet Registry name
    pub registry: String,
    /// Organization name extracted from the descriptor field
    pub organization: String,
}

/// Strip the header line and the trailing blank, returning the data lines.
fn strip_frame(raw: &str) -> Result<Vec<&str>, ParseError> {
    let mut lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    // Trailing empty element left by the final line terminator
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    // Column header
    if !lines.is_empty() {
        lines.remove(0);
    }
    if lines.is_empty() {
        return Err(ParseError::MalformedResponse);
    }
    Ok(lines)
}

/// Organization-name extraction shared by both dialects: everything before
/// the first space is the aut-num echo and is dropped; a leading `"- "`
/// separator is stripped. A descriptor with no space at all is kept whole.
fn extract_org_name(descriptor: &str) -> String {
    let name = match descriptor.split_once(' ') {
        Some((_, rest)) => rest,
        None => descriptor,
    };
    name.strip_prefix("- ").unwrap_or(name).trim().to_string()
}

/// Parse a comma-delimited ASN batch response into per-line replies.
///
/// A line that splits into more than one field yields the last field as
/// the country code and the remaining fields (rejoined) as the
/// organization descriptor. A single-field line means the ASN is valid
/// but unallocated.
pub fn parse_asn_response(raw: &str) -> Result<Vec<AsnReply>, ParseError> {
    let lines = strip_frame(raw)?;
    Ok(lines.iter().map(|line| parse_asn_line(line)).collect())
}

fn parse_asn_line(line: &str) -> AsnReply {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() > 1 {
        // The org description itself may contain commas; only the final
        // field is the country code.
        let country_code = fields[fields.len() - 1].trim().to_string();
        let descriptor = fields[..fields.len() - 1].concat();
        AsnReply::Allocated {
            organization: extract_org_name(&descriptor),
            country_code,
        }
    } else {
        AsnReply::Unallocated
    }
}

/// Parse a pipe-delimited verbose response into per-line replies.
///
/// Field order is `asn | ip | cidr | country | registry | date | org`;
/// the `ip` and `date` columns are not carried into the reply.
pub fn parse_ip_response(raw: &str) -> Result<Vec<IpReply>, ParseError> {
    let lines = strip_frame(raw)?;
    lines.iter().map(|line| parse_ip_line(line)).collect()
}

fn parse_ip_line(line: &str) -> Result<IpReply, ParseError> {
    let fields: Vec<&str> = line.split('|').map(str::trim).collect();
    if fields.len() < 7 {
        return Err(ParseError::MalformedLine {
            line: line.to_string(),
        });
    }
    let cidr: Cidr = fields[2].parse().map_err(|_| ParseError::MalformedLine {
        line: line.to_string(),
    })?;
    Ok(IpReply {
        asn: fields[0].to_string(),
        cidr,
        country_code: fields[3].to_string(),
        registry: fields[4].to_string(),
        organization: extract_ip_org(fields[6]),
    })
}

/// The verbose org descriptor is itself comma-delimited with a trailing
/// country suffix. A descriptor with no comma is kept whole rather than
/// dropped.
fn extract_ip_org(descriptor: &str) -> String {
    let parts: Vec<&str> = descriptor.split(',').collect();
    if parts.len() > 1 {
        extract_org_name(&parts[..parts.len() - 1].concat())
    } else {
        descriptor.trim().to_string()
    }
}
