//! Output configuration
//!
//! # Example
//!
//! ```toml
//! [snapcast]
//! port = 1704
//! bind_to_address = ["192.168.1.10"]
//! zeroconf = true
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

use crate::error::OutputError;
use crate::Result;

/// Default Snapcast server port
pub const DEFAULT_PORT: u16 = 1704;

/// Snapcast output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SnapcastConfig {
    /// TCP listening port
    /// Default: 1704
    pub port: u16,

    /// Address(es) to bind; empty means all interfaces
    pub bind_to_address: Vec<String>,

    /// Advertise the server via mDNS
    /// Default: true
    pub zeroconf: bool,
}

impl Default for SnapcastConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_to_address: Vec::new(),
            zeroconf: true,
        }
    }
}

impl SnapcastConfig {
    /// Create config with custom port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// Bad bind addresses are fatal at construction time, before any socket
    /// work happens.
    pub fn validate(&self) -> Result<()> {
        for addr in &self.bind_to_address {
            addr.parse::<IpAddr>().map_err(|e| {
                OutputError::InvalidConfig(format!("bad bind_to_address {addr:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// The socket addresses to bind
    pub fn bind_addrs(&self) -> Result<Vec<SocketAddr>> {
        if self.bind_to_address.is_empty() {
            return Ok(vec![SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                self.port,
            )]);
        }

        self.bind_to_address
            .iter()
            .map(|addr| {
                let ip = addr.parse::<IpAddr>().map_err(|e| {
                    OutputError::InvalidConfig(format!("bad bind_to_address {addr:?}: {e}"))
                })?;
                Ok(SocketAddr::new(ip, self.port))
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
