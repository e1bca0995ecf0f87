//! HTTP fetcher for relay information documents
//!
//! This module handles the one HTTP request the crawler makes per relay:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET with `Accept: application/nostr+json` (NIP-11)
//! - Error classification (transport, status, timeout, oversized body)
//!
//! Redirects are not followed: the target was never screened, so a 3xx is reported
//! as a status error. Failures are never retried; the caller records the document
//! as unknown.

use crate::config::ProbeConfig;
use crate::FetchError;
use reqwest::{header, redirect::Policy, Client};

/// Media type relays answer NIP-11 requests with
pub const NOSTR_JSON: &str = "application/nostr+json";

/// Largest information document accepted, in bytes
pub const MAX_INFO_DOCUMENT_BYTES: usize = 64 * 1024;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The probe configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use relay_miner::config::ProbeConfig;
/// use relay_miner::crawler::build_http_client;
///
/// let client = build_http_client(&ProbeConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ProbeConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.info_timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a relay's information document
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The `http://` or `https://` document URL
///
/// # Returns
///
/// * `Ok(Vec<u8>)` - The raw response body
/// * `Err(FetchError)` - Transport failure, non-success status (redirects included),
///   timeout, or a body over [`MAX_INFO_DOCUMENT_BYTES`]
pub async fn fetch_info_document(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let mut response = client
        .get(url)
        .header(header::ACCEPT, NOSTR_JSON)
        .send()
        .await
        .map_err(|e| classify(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let too_large = || FetchError::BodyTooLarge {
        url: url.to_string(),
        limit: MAX_INFO_DOCUMENT_BYTES,
    };

    if response
        .content_length()
        .is_some_and(|len| len > MAX_INFO_DOCUMENT_BYTES as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| classify(url, e))? {
        if body.len() + chunk.len() > MAX_INFO_DOCUMENT_BYTES {
            return Err(too_large());
        }
        body.extend_from_slice(&chunk);
    }

    tracing::trace!("Fetched {} bytes of information document from {}", body.len(), url);
    Ok(body)
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: err,
        }
    }
}
