//! Relay-list subscription over a relay's websocket
//!
//! One connection, one `REQ` for kind-10002 events, collect until the relay signals the
//! end of the subscription or the wall-clock limit runs out. On timeout the client
//! sends a close frame, drains briefly for the acknowledgement and returns what it
//! collected; a slow or silent relay never makes the call hang.

use crate::config::ProbeConfig;
use crate::protocol::{relay_list_request, Event, RelayMessage, RELAY_LIST_KIND};
use crate::FetchError;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Subscription id used for every relay-list request
pub const SUBSCRIPTION_ID: &str = "relay-miner";

/// Bounds of a single relay-list subscription
#[derive(Debug, Clone)]
pub struct PeerListConfig {
    pub connect_timeout: Duration,
    /// Wall-clock limit from connect to return
    pub timeout: Duration,
    /// Time allowed for the close handshake after the limit fires
    pub close_grace: Duration,
    /// Result cap sent with the request and enforced locally
    pub limit: u32,
}

impl From<&ProbeConfig> for PeerListConfig {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout(),
            timeout: config.peer_list_timeout(),
            close_grace: config.close_grace(),
            limit: config.peer_list_limit,
        }
    }
}

/// Why collection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// `EOSE`: all stored events delivered
    EndOfStoredEvents,
    /// `CLOSED`/`CLOSE`: the relay ended the subscription
    Closed,
    /// `NOTICE`: nothing further is read after a notice
    Notice,
    /// The configured result cap was reached
    LimitReached,
    /// The relay closed the connection or the stream failed
    Disconnected,
    /// The wall-clock limit fired
    TimedOut,
}

/// Events collected from one relay
#[derive(Debug, Clone)]
pub struct PeerList {
    pub events: Vec<Event>,
    pub termination: Termination,
}

/// Applies one text frame to the collection state
///
/// Returns `Some` when the frame ends the subscription. Malformed, `AUTH` and
/// unknown frames are logged and skipped.
pub(crate) fn apply_frame(
    url: &str,
    text: &str,
    events: &mut Vec<Event>,
    limit: u32,
) -> Option<Termination> {
    match RelayMessage::parse(text) {
        Ok(RelayMessage::Event { event, .. }) => {
            events.push(*event);
            if events.len() >= limit as usize {
                return Some(Termination::LimitReached);
            }
            None
        }
        Ok(RelayMessage::EndOfStoredEvents { .. }) => Some(Termination::EndOfStoredEvents),
        Ok(RelayMessage::Closed { message }) => {
            tracing::debug!("{} closed the subscription: {}", url, message);
            Some(Termination::Closed)
        }
        Ok(RelayMessage::Notice { message }) => {
            tracing::debug!("{} sent notice: {}", url, message);
            Some(Termination::Notice)
        }
        Ok(RelayMessage::Auth) => {
            tracing::debug!("{} requested AUTH, ignoring", url);
            None
        }
        Ok(RelayMessage::Other { tag }) => {
            tracing::debug!("{} sent unrecognized frame {}", url, tag);
            None
        }
        Err(e) => {
            tracing::warn!("Malformed frame from {}: {}", url, e);
            None
        }
    }
}

/// Collects relay-list events from a relay
///
/// # Arguments
///
/// * `url` - The `ws://` or `wss://` relay URL
/// * `config` - Connect timeout, wall-clock limit, close grace, and result cap
///
/// # Returns
///
/// * `Ok(PeerList)` - Collected events and the reason collection stopped; a timeout
///   or a dropped connection still returns what was collected
/// * `Err(FetchError)` - The connection or the subscription request failed
pub async fn fetch_peer_list(url: &str, config: &PeerListConfig) -> Result<PeerList, FetchError> {
    let deadline = Instant::now() + config.timeout;

    let (stream, _) = match timeout(config.connect_timeout, connect_async(url)).await {
        Ok(connected) => connected?,
        Err(_) => {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            })
        }
    };

    let (mut write, mut read) = stream.split();

    let request = relay_list_request(SUBSCRIPTION_ID, RELAY_LIST_KIND, config.limit);
    write.send(Message::Text(request)).await?;

    let mut events = Vec::new();
    let limit_timer = sleep_until(deadline);
    tokio::pin!(limit_timer);

    let termination = loop {
        tokio::select! {
            _ = &mut limit_timer => break Termination::TimedOut,
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Some(done) = apply_frame(url, &text, &mut events, config.limit) {
                        break done;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break Termination::Disconnected,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Websocket read from {} failed: {}", url, e);
                    break Termination::Disconnected;
                }
            },
        }
    };

    match termination {
        Termination::Disconnected => {}
        Termination::TimedOut => {
            tracing::info!(
                "Relay list from {} timed out after {:?}, closing with {} events",
                url,
                config.timeout,
                events.len()
            );
            let close = async {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!("Sending close frame to {} failed: {}", url, e);
                    return;
                }
                while let Some(frame) = read.next().await {
                    if matches!(frame, Ok(Message::Close(_)) | Err(_)) {
                        break;
                    }
                }
            };
            if timeout(config.close_grace, close).await.is_err() {
                tracing::debug!("{} did not acknowledge close", url);
            }
        }
        _ => {
            let _ = timeout(config.close_grace, write.close()).await;
        }
    }

    tracing::debug!(
        "Collected {} relay-list events from {} ({:?})",
        events.len(),
        url,
        termination
    );

    Ok(PeerList {
        events,
        termination,
    })
}
