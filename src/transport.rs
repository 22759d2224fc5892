//! Raw TCP transport for the bulk WHOIS exchange
//!
//! One connection per call: connect, send the full payload, half-close the
//! write side, read until the peer closes, drop the socket. EOF is the only
//! end-of-response signal; there is no sentinel line. Every exchange is
//! bounded by the configured deadlines and observes a cancellation token at
//! each await point, so an abandoned call never leaks a blocked socket.

use crate::config::ResolverConfig;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Errors raised by the transport layer. Each failure mode is a distinct,
/// reportable kind carrying the peer context and the underlying OS error.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WHOIS hostname could not be resolved
    #[error("failed to resolve {host}: {source}")]
    AddressResolution {
        /// Hostname that failed to resolve
        host: String,
        /// Underlying resolver error
        #[source]
        source: io::Error,
    },

    /// TCP connect failed (refused, unreachable)
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        /// Peer hostname
        host: String,
        /// Peer port
        port: u16,
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// TCP connect did not complete within the configured deadline
    #[error("timed out connecting to {host}:{port} after {after:?}")]
    ConnectTimeout {
        /// Peer hostname
        host: String,
        /// Peer port
        port: u16,
        /// Deadline that elapsed
        after: Duration,
    },

    /// Write failed after the connection was established
    #[error("failed to send query: {source}")]
    Send {
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// A read failed mid-stream; partial data is discarded
    #[error("failed to read response: {source}")]
    Read {
        /// Underlying socket error
        #[source]
        source: io::Error,
    },

    /// The exchange did not complete within the configured deadline
    #[error("exchange timed out after {after:?}")]
    Timeout {
        /// Deadline that elapsed
        after: Duration,
    },

    /// The caller cancelled the exchange
    #[error("exchange cancelled")]
    Cancelled,
}

/// A single request/response exchange with the bulk WHOIS service.
///
/// The resolution engine talks to the wire only through this trait, so
/// tests can substitute a deterministic stub.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    /// Send `payload` and return the raw response text read to EOF.
    async fn exchange(
        &self,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError>;
}

/// TCP implementation of [`WhoisTransport`].
#[derive(Debug, Clone)]
pub struct TcpTransport {
    config: ResolverConfig,
}

impl TcpTransport {
    /// Create a transport for the configured WHOIS endpoint.
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    async fn connect(&self, cancel: &CancellationToken) -> Result<TcpStream, TransportError> {
        let host = &self.config.whois_host;
        let port = self.config.whois_port;
        let verbose = verbose_level();

        let resolved = tokio::select! {
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            resolved = tokio::net::lookup_host((host.as_str(), port)) => resolved,
        };
        let addrs: Vec<SocketAddr> = resolved
            .map_err(|source| TransportError::AddressResolution {
                host: host.clone(),
                source,
            })?
            .collect();
        if addrs.is_empty() {
            return Err(TransportError::AddressResolution {
                host: host.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
            });
        }

        let mut last_err: Option<io::Error> = None;
        for addr in addrs {
            if verbose >= 2 {
                eprintln!("[whois] connecting to {} (resolved from {})", addr, host);
            }
            let attempt = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr));
            tokio::select! {
                _ = cancel.cancelled() => return Err(TransportError::Cancelled),
                result = attempt => match result {
                    Ok(Ok(stream)) => return Ok(stream),
                    Ok(Err(e)) => {
                        if verbose >= 2 {
                            eprintln!("[whois] connect to {} failed: {}", addr, e);
                        }
                        last_err = Some(e);
                    }
                    Err(_) => {
                        return Err(TransportError::ConnectTimeout {
                            host: host.clone(),
                            port,
                            after: self.config.connect_timeout,
                        })
                    }
                },
            }
        }
        Err(TransportError::Connect {
            host: host.clone(),
            port,
            source: last_err.unwrap_or_else(|| io::Error::other("connect failed")),
        })
    }

    async fn run_exchange(
        &self,
        mut stream: TcpStream,
        payload: &str,
    ) -> Result<String, TransportError> {
        stream
            .write_all(payload.as_bytes())
            .await
            .map_err(|source| TransportError::Send { source })?;
        // Half-close the write side: the peer sees "no more input" and
        // replies, then closes, which ends our read loop.
        stream
            .shutdown()
            .await
            .map_err(|source| TransportError::Send { source })?;

        let mut response = Vec::new();
        let mut chunk = vec![0u8; self.config.read_chunk_size];
        loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|source| TransportError::Read { source })?;
            if n == 0 {
                break;
            }
            response.extend_from_slice(&chunk[..n]);
        }
        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}

#[async_trait]
impl WhoisTransport for TcpTransport {
    async fn exchange(
        &self,
        payload: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TransportError> {
        let stream = self.connect(cancel).await?;
        let deadline = self.config.exchange_timeout;
        // The stream lives inside the exchange future; cancellation or
        // timeout drops the future and closes the socket with it.
        tokio::select! {
            _ = cancel.cancelled() => Err(TransportError::Cancelled),
            result = tokio::time::timeout(deadline, self.run_exchange(stream, payload)) => {
                match result {
                    Ok(inner) => inner,
                    Err(_) => Err(TransportError::Timeout { after: deadline }),
                }
            }
        }
    }
}

fn verbose_level() -> u8 {
    std::env::var("ASNR_VERBOSE")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0)
}
