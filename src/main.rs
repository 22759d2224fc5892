//! asnr - Bulk ASN and IP origin lookup over the WHOIS bulk interface.
//!
//! This is the command-line interface for the asnr library; all protocol
//! logic lives in the library.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use asnr::resolver::AsnRecord;
use asnr::{AsnResolver, ResolverConfig};
use clap::{Parser, Subcommand};
use std::time::Duration;

/// Get the version string for asnr
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for the lookup tool.
#[derive(Parser, Debug)]
#[clap(author, version = get_version(), about = "Bulk ASN and IP origin lookup over WHOIS", long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// WHOIS host to query
    #[clap(long, global = true, default_value = asnr::config::DEFAULT_WHOIS_HOST)]
    whois_host: String,

    /// WHOIS TCP port
    #[clap(long, global = true, default_value_t = asnr::config::DEFAULT_WHOIS_PORT)]
    whois_port: u16,

    /// Deadline for the full exchange in milliseconds
    #[clap(long, global = true, default_value_t = asnr::config::DEFAULT_EXCHANGE_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Output results in JSON format
    #[clap(long, global = true)]
    json: bool,

    /// Enable verbose output (use -vv for connection tracing)
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve AS numbers to organization and country
    Asn {
        /// AS numbers (bare digits), space- or comma-separated
        #[clap(required = true)]
        identifiers: Vec<String>,

        /// Output CSV with the legacy column layout (takes precedence
        /// over --json)
        #[clap(long)]
        csv: bool,
    },
    /// Resolve IPv4 addresses to their announced prefixes
    Ip {
        /// IPv4 addresses, space- or comma-separated
        #[clap(required = true)]
        addresses: Vec<String>,
    },
    /// Validate AS numbers without contacting the remote service
    Validate {
        /// AS numbers, space- or comma-separated
        identifiers: Vec<String>,
    },
}

/// Accept both space-separated and comma-separated identifier lists.
fn split_inputs(raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|chunk| chunk.split(','))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose > 0 {
        std::env::set_var("ASNR_VERBOSE", args.verbose.to_string());
    }

    let config = ResolverConfig::builder()
        .whois_host(args.whois_host.as_str())
        .whois_port(args.whois_port)
        .exchange_timeout(Duration::from_millis(args.timeout_ms))
        .build()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    let resolver = AsnResolver::new(config);

    match args.command {
        Command::Validate { identifiers } => {
            let inputs = split_inputs(&identifiers);
            let outcomes = resolver.validate_asns(&inputs);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&outcomes)?);
            } else {
                for outcome in outcomes {
                    let verdict = if outcome.valid { "valid" } else { "invalid" };
                    println!("{}\t{}", outcome.identifier, verdict);
                }
            }
        }
        Command::Asn { identifiers, csv } => {
            let inputs = split_inputs(&identifiers);
            let resolution = resolver.resolve_asns(&inputs).await?;
            if csv {
                print!("{}", resolution.to_csv());
            } else if args.json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                for record in &resolution.success {
                    match record {
                        AsnRecord::Resolved {
                            as_number,
                            organization,
                            country_code,
                        } => println!("AS{}\t{}\t{}", as_number, country_code, organization),
                        AsnRecord::Unallocated { as_number } => {
                            println!("AS{}\t--\t(unallocated)", as_number);
                        }
                    }
                }
                for invalid in &resolution.error {
                    eprintln!("{}: {}", invalid.identifier, invalid.reason);
                }
            }
        }
        Command::Ip { addresses } => {
            let inputs = split_inputs(&addresses);
            let resolution = resolver.resolve_ips(&inputs).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                for record in &resolution.success {
                    println!(
                        "AS{}\t{}\t{}\t{} hosts\t{}",
                        record.asn,
                        record.normalized,
                        record.country_code,
                        record.host_count,
                        record.organization
                    );
                }
                for err in &resolution.error {
                    eprintln!("{}: {}", err.address, err.reason);
                }
            }
        }
    }

    Ok(())
}
