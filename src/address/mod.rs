//! Address handling module for Relay Miner
//!
//! This module provides utilities for relay address normalization, safety
//! screening, and DNS resolution.

mod normalize;
mod resolve;
mod validate;

pub use normalize::clean_name;
pub use resolve::{resolve_host, Resolver, SystemResolver};
pub use validate::{classify_ip, parse_relay_address, validate_address};

use url::Url;

/// Builds the HTTP URL used to fetch a relay's information document
///
/// The document is requested from the host and port of the validated address,
/// at the root path. Relays announced as `ws://` are probed over plain HTTP;
/// everything else over HTTPS.
///
/// # Examples
///
/// ```
/// use relay_miner::address::{info_document_url, parse_relay_address};
///
/// let url = parse_relay_address("ws://relay.one/").unwrap();
/// assert_eq!(info_document_url(&url), "http://relay.one/");
/// let url = parse_relay_address("wss://relay.one/nostr").unwrap();
/// assert_eq!(info_document_url(&url), "https://relay.one/");
/// ```
pub fn info_document_url(url: &Url) -> String {
    let scheme = if url.scheme() == "ws" { "http" } else { "https" };
    let host = match url.host() {
        Some(host) => host.to_string(),
        None => String::new(),
    };
    match url.port() {
        Some(port) => format!("{}://{}:{}/", scheme, host, port),
        None => format!("{}://{}/", scheme, host),
    }
}

/// Builds the websocket URL used to subscribe to a relay
///
/// HTTP schemes are mapped onto their websocket counterparts; anything else is
/// used as parsed.
pub fn websocket_url(url: &Url) -> String {
    let mut ws = url.clone();
    let scheme = match url.scheme() {
        "http" => Some("ws"),
        "https" => Some("wss"),
        _ => None,
    };
    if let Some(scheme) = scheme {
        // http/https -> ws/wss is always allowed between special schemes
        let _ = ws.set_scheme(scheme);
    }
    ws.to_string()
}
