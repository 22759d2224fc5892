//! Resolution engine
//!
//! Ties the validator, query builder, transport, and parser together into
//! the collaborator-facing API: partition the input, batch the valid set,
//! run one exchange, and zip the parsed records back onto the inputs
//! positionally. Validation-only mode never touches the network.

pub mod types;


use crate::cidr::is_reserved_ip;
use crate::config::ResolverConfig;
use crate::parse::{self, AsnReply, ParseError};
use crate::query::{build_asn_query, build_ip_query};
use crate::transport::{TcpTransport, TransportError, WhoisTransport};
use crate::validate::{validate_candidate, ValidationOutcome};
use std::net::Ipv4Addr;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub use types::{
    AggregateResult, AsnRecord, AsnResolution, CidrRecord, InvalidAsn, IpLookupError, IpResolution,
};

/// Errors raised by a resolution call.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every input was filtered out before the exchange; a client-input
    /// error, never retried
    #[error("no valid identifiers in input")]
    EmptyValidSet,

    /// The exchange with the remote service failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote response violated the protocol contract
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Bulk ASN / IP origin resolution engine.
///
/// One TCP connection is opened, used, and closed per call; the engine
/// holds no mutable state, so concurrent calls need no coordination.
///
/// # Examples
///
/// ```no_run
/// use asnr::{AsnResolver, ResolverConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = AsnResolver::new(ResolverConfig::default());
///     let resolution = resolver.resolve_asns(&["15169", "3356"]).await?;
///     for record in &resolution.success {
///         println!("{record:?}");
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AsnResolver {
    transport: Arc<dyn WhoisTransport>,
}

impl AsnResolver {
    /// Create a resolver speaking TCP to the configured WHOIS endpoint.
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            transport: Arc::new(TcpTransport::new(config)),
        }
    }

    /// Create a resolver with a custom transport (test stubs, proxies).
    pub fn with_transport(transport: Arc<dyn WhoisTransport>) -> Self {
        Self { transport }
    }

    /// Validation-only mode: classify every identifier without any
    /// network call. Empty input yields an empty map.
    pub fn validate_asns<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<ValidationOutcome> {
        identifiers
            .iter()
            .map(|raw| validate_candidate(raw.as_ref()))
            .collect()
    }

    /// Resolve a batch of ASN identifiers.
    ///
    /// Invalid identifiers go to the error partition with reason
    /// `"invalid aut-num"` and are never sent to the wire. Fails with
    /// [`ResolveError::EmptyValidSet`] when nothing survives validation.
    pub async fn resolve_asns<S: AsRef<str>>(
        &self,
        identifiers: &[S],
    ) -> Result<AsnResolution, ResolveError> {
        self.resolve_asns_with_cancel(identifiers, &CancellationToken::new())
            .await
    }

    /// [`Self::resolve_asns`] observing a caller-owned cancellation token.
    pub async fn resolve_asns_with_cancel<S: AsRef<str>>(
        &self,
        identifiers: &[S],
        cancel: &CancellationToken,
    ) -> Result<AsnResolution, ResolveError> {
        let outcomes: Vec<ValidationOutcome> = identifiers
            .iter()
            .map(|raw| validate_candidate(raw.as_ref()))
            .collect();
        let valid: Vec<u64> = outcomes
            .iter()
            .filter(|o| o.valid)
            .filter_map(|o| o.as_number)
            .collect();
        if valid.is_empty() {
            return Err(ResolveError::EmptyValidSet);
        }

        let payload = build_asn_query(&valid);
        let raw = self.transport.exchange(&payload, cancel).await?;
        let replies = parse::parse_asn_response(&raw)?;
        // The server echoes one line per query line, in order; anything
        // else is a contract violation.
        if replies.len() != valid.len() {
            return Err(ParseError::MalformedResponse.into());
        }

        let mut success = Vec::with_capacity(valid.len());
        let mut error = Vec::new();
        let mut replies = replies.into_iter();
        for outcome in &outcomes {
            // Replies are consumed only for valid identifiers, keeping the
            // positional mapping aligned.
            if let (true, Some(as_number)) = (outcome.valid, outcome.as_number) {
                match replies.next() {
                    Some(AsnReply::Allocated {
                        organization,
                        country_code,
                    }) => success.push(AsnRecord::Resolved {
                        as_number,
                        organization,
                        country_code,
                    }),
                    Some(AsnReply::Unallocated) => {
                        success.push(AsnRecord::Unallocated { as_number });
                    }
                    // Unreachable given the count check above
                    None => return Err(ParseError::MalformedResponse.into()),
                }
            } else {
                error.push(InvalidAsn::new(outcome.identifier.clone()));
            }
        }
        Ok(AggregateResult { success, error })
    }

    /// Resolve a batch of IPv4 addresses to their announced prefixes.
    ///
    /// Unparseable and private/reserved addresses go to the error
    /// partition without contacting the remote service; the remaining
    /// public addresses share a single batched exchange. Fails with
    /// [`ResolveError::EmptyValidSet`] when no address is queryable.
    pub async fn resolve_ips<S: AsRef<str>>(
        &self,
        addresses: &[S],
    ) -> Result<IpResolution, ResolveError> {
        self.resolve_ips_with_cancel(addresses, &CancellationToken::new())
            .await
    }

    /// [`Self::resolve_ips`] observing a caller-owned cancellation token.
    pub async fn resolve_ips_with_cancel<S: AsRef<str>>(
        &self,
        addresses: &[S],
        cancel: &CancellationToken,
    ) -> Result<IpResolution, ResolveError> {
        enum Slot {
            Public(Ipv4Addr),
            Filtered(IpLookupError),
        }

        let slots: Vec<Slot> = addresses
            .iter()
            .map(|raw| {
                let trimmed = raw.as_ref().trim();
                match trimmed.parse::<Ipv4Addr>() {
                    Ok(addr) if is_reserved_ip(&addr) => Slot::Filtered(IpLookupError {
                        address: trimmed.to_string(),
                        reason: "private or reserved address".to_string(),
                    }),
                    Ok(addr) => Slot::Public(addr),
                    Err(_) => Slot::Filtered(IpLookupError {
                        address: trimmed.to_string(),
                        reason: "not an IPv4 address".to_string(),
                    }),
                }
            })
            .collect();

        let public: Vec<Ipv4Addr> = slots
            .iter()
            .filter_map(|slot| match slot {
                Slot::Public(addr) => Some(*addr),
                Slot::Filtered(_) => None,
            })
            .collect();
        if public.is_empty() {
            return Err(ResolveError::EmptyValidSet);
        }

        let payload = build_ip_query(&public);
        let raw = self.transport.exchange(&payload, cancel).await?;
        let replies = parse::parse_ip_response(&raw)?;
        if replies.len() != public.len() {
            return Err(ParseError::MalformedResponse.into());
        }

        let mut success = Vec::with_capacity(public.len());
        let mut error = Vec::new();
        let mut replies = replies.into_iter();
        for slot in slots {
            match slot {
                Slot::Public(_) => {
                    if let Some(reply) = replies.next() {
                        success.push(CidrRecord {
                            normalized: reply.cidr.normalized(),
                            host_count: reply.cidr.host_count(),
                            prefix: reply.cidr,
                            asn: reply.asn,
                            country_code: reply.country_code,
                            organization: reply.organization,
                        });
                    }
                }
                Slot::Filtered(err) => error.push(err),
            }
        }
        Ok(AggregateResult { success, error })
    }
}
