//! Relay-to-client frames and the subscription request

use crate::protocol::event::Event;
use serde_json::{json, Value};
use thiserror::Error;

/// Errors decoding a single websocket frame
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not a JSON array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is an empty array")]
    Empty,

    #[error("frame tag is not a string")]
    MissingTag,

    #[error("EVENT frame without a valid event: {0}")]
    InvalidEvent(String),
}

/// A message sent by a relay, keyed by the tag in the first array element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// `["EVENT", <subscription_id>, <event>]`
    Event {
        subscription_id: String,
        event: Box<Event>,
    },

    /// `["EOSE", <subscription_id>]`
    EndOfStoredEvents { subscription_id: String },

    /// `["CLOSED", <subscription_id>, <message>]`, also the legacy `CLOSE`
    Closed { message: String },

    /// `["NOTICE", <message>]`
    Notice { message: String },

    /// `["AUTH", <challenge>]`
    Auth,

    /// Any other tag (`OK`, `COUNT`, ...)
    Other { tag: String },
}

impl RelayMessage {
    /// Decodes a text frame
    ///
    /// # Examples
    ///
    /// ```
    /// use relay_miner::protocol::RelayMessage;
    ///
    /// let msg = RelayMessage::parse(r#"["EOSE","miner"]"#).unwrap();
    /// assert!(matches!(msg, RelayMessage::EndOfStoredEvents { .. }));
    /// ```
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let mut frame: Vec<Value> = serde_json::from_str(text)?;
        if frame.is_empty() {
            return Err(FrameError::Empty);
        }

        let tag = frame[0].as_str().ok_or(FrameError::MissingTag)?.to_string();
        let string_at = |frame: &[Value], index: usize| {
            frame
                .get(index)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let message = match tag.as_str() {
            "EVENT" => {
                let subscription_id = string_at(&frame, 1);
                if frame.len() < 3 {
                    return Err(FrameError::InvalidEvent("missing payload".to_string()));
                }
                let payload = frame.swap_remove(2);
                let event: Event = serde_json::from_value(payload)
                    .map_err(|e| FrameError::InvalidEvent(e.to_string()))?;
                Self::Event {
                    subscription_id,
                    event: Box::new(event),
                }
            }
            "EOSE" => Self::EndOfStoredEvents {
                subscription_id: string_at(&frame, 1),
            },
            "CLOSED" | "CLOSE" => Self::Closed {
                message: string_at(&frame, 2),
            },
            "NOTICE" => Self::Notice {
                message: string_at(&frame, 1),
            },
            "AUTH" => Self::Auth,
            _ => Self::Other { tag },
        };

        Ok(message)
    }
}

/// Encodes the REQ frame asking a relay for relay-list events
pub fn relay_list_request(subscription_id: &str, kind: u32, limit: u32) -> String {
    json!(["REQ", subscription_id, { "kinds": [kind], "limit": limit }]).to_string()
}
