//! Validation outcomes for relay addresses
//!
//! This module defines why an address can be refused and how that is recorded.

use std::fmt;

/// Reason a relay address was refused before any network access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// The address could not be parsed as a URL with a host
    InvalidUrl,

    /// Host is inside a private range (10/8, 172.16/12, 192.168/16, fc00::/7)
    PrivateAddress,

    /// Host is a loopback address
    LoopbackAddress,

    /// Host is inside the shared address space 100.64.0.0/10
    CarrierGradeNat,

    /// Host is link-local (169.254/16, fe80::/10), which includes cloud metadata endpoints
    LinkLocalAddress,

    /// Host is unspecified or in "this network" (0/8, ::)
    UnspecifiedAddress,

    /// Host is a Tor hidden service
    TorAddress,

    /// Hostname did not resolve to any IP address
    DnsResolutionFailed,
}

impl RejectReason {
    /// Returns the reason string that is persisted with the relay
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "Invalid URL",
            Self::PrivateAddress => "Private IP address",
            Self::LoopbackAddress => "Loopback IP address",
            Self::CarrierGradeNat => "Carrier-Grade NAT IP address",
            Self::LinkLocalAddress => "Link-local IP address",
            Self::UnspecifiedAddress => "Unspecified IP address",
            Self::TorAddress => "TOR network address",
            Self::DnsResolutionFailed => "DNS resolution failed",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation state of a relay task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Not checked yet
    #[default]
    Unchecked,

    /// Address and DNS checks passed
    Valid,

    /// Refused; terminal for the task
    Rejected(RejectReason),
}

impl Validation {
    /// Returns true only for a relay that passed both checks
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the rejection reason, or an empty string
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Rejected(reason) => reason.as_str(),
            Self::Unchecked | Self::Valid => "",
        }
    }
}
