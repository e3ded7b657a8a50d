//! Identity resolution.
//!
//! # Responsibilities
//! - Find the outbound-facing local IP without any network round-trip
//! - Read the OS host name
//! - Degrade to loopback / placeholder instead of failing startup

use std::io;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use sysinfo::System;
use thiserror::Error;

use crate::config::InstanceConfig;

/// Public address used only to let the OS pick a route; nothing is sent.
pub const ROUTE_PROBE_TARGET: &str = "8.8.8.8:80";

/// Address advertised when no outbound route exists.
pub const LOOPBACK_IP: &str = "127.0.0.1";

/// Host name advertised when the OS does not report one.
pub const PLACEHOLDER_HOST: &str = "localhost";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no outbound route: {0}")]
    NoRoute(#[from] io::Error),

    #[error("OS bound an unspecified local address")]
    Unspecified,

    #[error("host name unavailable")]
    HostNameUnavailable,
}

/// Advertised network identity of this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub host_name: String,
    pub ip_address: String,
}

/// Local address the OS would use to reach `target`.
///
/// Connecting a UDP socket only consults the routing table.
pub fn outbound_ip_via(target: &str) -> Result<IpAddr, IdentityError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(target)?;
    let ip = socket.local_addr()?.ip();
    if ip.is_unspecified() {
        return Err(IdentityError::Unspecified);
    }
    Ok(ip)
}

pub fn host_name() -> Result<String, IdentityError> {
    System::host_name()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .ok_or(IdentityError::HostNameUnavailable)
}

/// Resolve the IP to advertise, falling back to loopback.
pub fn resolve_ip(target: &str) -> String {
    match outbound_ip_via(target) {
        Ok(ip) => ip.to_string(),
        Err(e) => {
            tracing::warn!(
                error = %e,
                fallback = LOOPBACK_IP,
                "Could not detect outbound IP, using loopback"
            );
            LOOPBACK_IP.to_string()
        }
    }
}

/// Resolve the host name to advertise, falling back to a placeholder.
pub fn resolve_host_name() -> String {
    match host_name() {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, fallback = PLACEHOLDER_HOST, "Could not read host name");
            PLACEHOLDER_HOST.to_string()
        }
    }
}

/// Resolve the full identity once at startup. Configured overrides skip
/// detection for their field.
pub fn resolve(config: &InstanceConfig) -> Identity {
    let ip_address = match &config.ip_address {
        Some(ip) => ip.clone(),
        None => resolve_ip(ROUTE_PROBE_TARGET),
    };
    let host_name = match &config.host_name {
        Some(name) => name.clone(),
        None => resolve_host_name(),
    };

    tracing::info!(host = %host_name, ip = %ip_address, "Instance identity resolved");

    Identity {
        host_name,
        ip_address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_target_falls_back_to_loopback() {
        assert!(outbound_ip_via("not-an-address").is_err());
        assert_eq!(resolve_ip("not-an-address"), LOOPBACK_IP);
    }

    #[test]
    fn test_resolve_always_yields_ip() {
        let identity = resolve(&InstanceConfig::default());
        assert!(!identity.ip_address.is_empty());
        assert!(identity.ip_address.parse::<IpAddr>().is_ok());
        assert!(!identity.host_name.is_empty());
    }

    #[test]
    fn test_overrides_skip_detection() {
        let config = InstanceConfig {
            host_name: Some("node-7".into()),
            ip_address: Some("10.9.8.7".into()),
            ..InstanceConfig::default()
        };
        assert_eq!(
            resolve(&config),
            Identity {
                host_name: "node-7".into(),
                ip_address: "10.9.8.7".into(),
            }
        );
    }

    #[test]
    fn test_loopback_route() {
        let ip = outbound_ip_via("127.0.0.1:9").unwrap();
        assert!(ip.is_loopback());
    }
}
