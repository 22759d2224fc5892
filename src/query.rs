//! Bulk query payload construction
//!
//! The WHOIS bulk interface frames a batch of lookups between `begin` and
//! `end` lines, each line CRLF-terminated. The IP dialect additionally
//! requests the pipe-delimited `verbose` output format. Input order is
//! preserved and duplicates are kept: the server echoes one response line
//! per request line, and the parser maps them back positionally.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

/// Build the wire payload for a batch of AS numbers.
///
/// Produces `begin\r\n`, one `as<digits>\r\n` line per identifier, then
/// `end\r\n`.
pub fn build_asn_query(as_numbers: &[u64]) -> String {
    let mut payload = String::from("begin\r\n");
    for asn in as_numbers {
        let _ = write!(payload, "as{asn}\r\n");
    }
    payload.push_str("end\r\n");
    payload
}

/// Build the wire payload for a batch of IPv4 addresses.
///
/// Produces `verbose\r\nbegin\r\n`, one raw address per line, then
/// `end\r\n`.
pub fn build_ip_query(addresses: &[Ipv4Addr]) -> String {
    let mut payload = String::from("verbose\r\nbegin\r\n");
    for addr in addresses {
        let _ = write!(payload, "{addr}\r\n");
    }
    payload.push_str("end\r\n");
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asn_query_exact_bytes() {
        assert_eq!(build_asn_query(&[1, 2]), "begin\r\nas1\r\nas2\r\nend\r\n");
    }

    #[test]
    fn test_asn_query_empty_batch() {
        assert_eq!(build_asn_query(&[]), "begin\r\nend\r\n");
    }

    #[test]
    fn test_asn_query_keeps_duplicates_and_order() {
        let payload = build_asn_query(&[3356, 15169, 3356]);
        assert_eq!(payload, "begin\r\nas3356\r\nas15169\r\nas3356\r\nend\r\n");
    }

    #[test]
    fn test_ip_query_exact_bytes() {
        let addrs: Vec<Ipv4Addr> = vec!["8.8.8.8".parse().unwrap(), "1.1.1.1".parse().unwrap()];
        assert_eq!(
            build_ip_query(&addrs),
            "verbose\r\nbegin\r\n8.8.8.8\r\n1.1.1.1\r\nend\r\n"
        );
    }
}
