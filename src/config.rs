//! Resolver configuration with compile-time defaults and runtime overrides
//!
//! Default values are defined as constants; callers override them through
//! the builder. The config is read-only once the resolver is constructed,
//! so concurrent resolution calls never coordinate on shared state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default bulk WHOIS host
pub const DEFAULT_WHOIS_HOST: &str = "whois.cymru.com";
/// Default bulk WHOIS TCP port
pub const DEFAULT_WHOIS_PORT: u16 = 43;
/// Default TCP connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
/// Default deadline for the full send/read exchange in milliseconds
pub const DEFAULT_EXCHANGE_TIMEOUT_MS: u64 = 15_000;
/// Default socket read chunk size in bytes
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Configuration for the resolution engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Hostname of the bulk WHOIS service
    pub whois_host: String,
    /// TCP port of the bulk WHOIS service
    pub whois_port: u16,
    /// Timeout for establishing the TCP connection
    pub connect_timeout: Duration,
    /// Deadline for the full exchange after the connection is up
    pub exchange_timeout: Duration,
    /// Read buffer chunk size
    pub read_chunk_size: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            whois_host: DEFAULT_WHOIS_HOST.to_string(),
            whois_port: DEFAULT_WHOIS_PORT,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            exchange_timeout: Duration::from_millis(DEFAULT_EXCHANGE_TIMEOUT_MS),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}

impl ResolverConfig {
    /// Create a new ResolverConfig builder
    pub fn builder() -> ResolverConfigBuilder {
        ResolverConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.whois_host.is_empty() {
            return Err("whois_host must not be empty".to_string());
        }
        if self.whois_port == 0 {
            return Err("whois_port must be non-zero".to_string());
        }
        if self.connect_timeout.as_millis() == 0 {
            return Err("connect_timeout must be greater than 0".to_string());
        }
        if self.exchange_timeout.as_millis() == 0 {
            return Err("exchange_timeout must be greater than 0".to_string());
        }
        if self.read_chunk_size == 0 {
            return Err("read_chunk_size must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Builder for ResolverConfig
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            config: ResolverConfig::default(),
        }
    }

    /// Set the WHOIS hostname
    pub fn whois_host(mut self, host: impl Into<String>) -> Self {
        self.config.whois_host = host.into();
        self
    }

    /// Set the WHOIS TCP port
    pub fn whois_port(mut self, port: u16) -> Self {
        self.config.whois_port = port;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the exchange deadline
    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.config.exchange_timeout = timeout;
        self
    }

    /// Set the read chunk size
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Build the configuration, checking it for consistency
    pub fn build(self) -> Result<ResolverConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ResolverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
