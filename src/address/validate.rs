use crate::state::RejectReason;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Scheme assumed for addresses written without one
const DEFAULT_SCHEME: &str = "wss://";

/// Parses a relay address into a URL with a host
///
/// Relay lists frequently contain bare hostnames (`relay.one`) or bare IPs
/// (`10.0.0.5`); those are read as `wss://` addresses so their host can still be
/// classified.
pub fn parse_relay_address(address: &str) -> Result<Url, RejectReason> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(RejectReason::InvalidUrl);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, trimmed)
    };

    let url = Url::parse(&candidate).map_err(|_| RejectReason::InvalidUrl)?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(RejectReason::InvalidUrl),
    }
}

/// Validates that a relay address may be contacted
///
/// This is the gate in front of every network call the crawler makes: it refuses
/// malformed addresses, IP literals inside private, loopback, shared (CGNAT),
/// link-local or unspecified ranges, and Tor hidden services. Hostnames are checked again against the same
/// ranges after DNS resolution (see [`resolve_host`](super::resolve_host)).
///
/// # Examples
///
/// ```
/// use relay_miner::address::validate_address;
/// use relay_miner::RejectReason;
///
/// assert!(validate_address("wss://relay.damus.io/").is_ok());
/// assert_eq!(validate_address("10.0.0.5"), Err(RejectReason::PrivateAddress));
/// ```
pub fn validate_address(address: &str) -> Result<Url, RejectReason> {
    let url = parse_relay_address(address)?;

    match url.host() {
        Some(Host::Ipv4(ip)) => {
            if let Some(reason) = classify_ip(IpAddr::V4(ip)) {
                return Err(reason);
            }
        }
        Some(Host::Ipv6(ip)) => {
            if let Some(reason) = classify_ip(IpAddr::V6(ip)) {
                return Err(reason);
            }
        }
        Some(Host::Domain(domain)) => {
            if is_onion(domain) {
                return Err(RejectReason::TorAddress);
            }
        }
        None => return Err(RejectReason::InvalidUrl),
    }

    let raw = address.trim();
    if raw.ends_with(".onion") || raw.ends_with(".onion/") {
        return Err(RejectReason::TorAddress);
    }

    Ok(url)
}

/// Classifies an IP address that must not be contacted
///
/// Returns None for publicly routable addresses.
pub fn classify_ip(ip: IpAddr) -> Option<RejectReason> {
    match ip {
        IpAddr::V4(v4) => classify_ipv4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => classify_ipv4(v4),
            None => classify_ipv6(v6),
        },
    }
}

fn classify_ipv4(ip: Ipv4Addr) -> Option<RejectReason> {
    if ip.is_private() {
        return Some(RejectReason::PrivateAddress);
    }
    if ip.is_loopback() {
        return Some(RejectReason::LoopbackAddress);
    }
    if is_shared(ip) {
        return Some(RejectReason::CarrierGradeNat);
    }
    if ip.is_link_local() {
        return Some(RejectReason::LinkLocalAddress);
    }
    // 0.0.0.0/8
    if ip.octets()[0] == 0 {
        return Some(RejectReason::UnspecifiedAddress);
    }
    None
}

fn classify_ipv6(ip: Ipv6Addr) -> Option<RejectReason> {
    // fc00::/7
    if (ip.segments()[0] & 0xfe00) == 0xfc00 {
        return Some(RejectReason::PrivateAddress);
    }
    if ip.is_loopback() {
        return Some(RejectReason::LoopbackAddress);
    }
    // fe80::/10
    if (ip.segments()[0] & 0xffc0) == 0xfe80 {
        return Some(RejectReason::LinkLocalAddress);
    }
    if ip.is_unspecified() {
        return Some(RejectReason::UnspecifiedAddress);
    }
    None
}

/// 100.64.0.0/10
fn is_shared(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 100 && (octets[1] & 0xc0) == 64
}

fn is_onion(domain: &str) -> bool {
    domain.trim_end_matches('.').to_ascii_lowercase().ends_with(".onion")
}
