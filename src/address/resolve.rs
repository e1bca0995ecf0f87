//! Hostname resolution for relay addresses

use crate::address::validate::classify_ip;
use crate::state::RejectReason;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use url::{Host, Url};

/// Resolves hostnames to IP addresses
///
/// The crawler resolves every relay before contacting it. Abstracting the lookup
/// lets tests drive the crawler without touching real DNS.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Looks up all addresses for a host
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (getaddrinfo through tokio)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolver for SystemResolver {
    async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Resolves the host of a validated relay URL
///
/// Returns the resolved addresses in lookup order with duplicates removed. A
/// lookup failure or an empty answer is reported as
/// [`RejectReason::DnsResolutionFailed`]; an answer containing any address
/// [`classify_ip`] refuses is rejected with the matching reason, so a public hostname
/// pointing into internal infrastructure is treated like the IP literal itself.
pub async fn resolve_host(resolver: &dyn Resolver, url: &Url) -> Result<Vec<IpAddr>, RejectReason> {
    let port = url.port_or_known_default().unwrap_or(443);

    let ips = match url.host() {
        Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
        Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
        Some(Host::Domain(domain)) => match resolver.lookup(domain, port).await {
            Ok(ips) => ips,
            Err(e) => {
                tracing::debug!("DNS lookup for {} failed: {}", domain, e);
                return Err(RejectReason::DnsResolutionFailed);
            }
        },
        None => return Err(RejectReason::InvalidUrl),
    };

    let mut unique: Vec<IpAddr> = Vec::with_capacity(ips.len());
    for ip in ips {
        if !unique.contains(&ip) {
            unique.push(ip);
        }
    }

    if unique.is_empty() {
        return Err(RejectReason::DnsResolutionFailed);
    }

    if let Some(reason) = unique.iter().find_map(|ip| classify_ip(*ip)) {
        return Err(reason);
    }

    Ok(unique)
}
