//! Nostr events and relay-list extraction

use serde::{Deserialize, Serialize};

/// Event kind of a NIP-65 relay list
pub const RELAY_LIST_KIND: u32 = 10002;

/// A Nostr event as delivered by a relay
///
/// Every field defaults so a partially-conforming event still deserializes;
/// signatures are not verified since the crawler only reads relay hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub id: String,

    /// Hex public key of the author
    #[serde(default)]
    pub pubkey: String,

    #[serde(default)]
    pub created_at: i64,

    #[serde(default)]
    pub kind: u32,

    #[serde(default)]
    pub tags: Vec<Vec<String>>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub sig: String,
}

impl Event {
    /// Returns the relay addresses named by the event's `r` tags
    pub fn relay_urls(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().filter_map(|tag| match tag.as_slice() {
            [name, url, ..] if name == "r" => Some(url.as_str()),
            _ => None,
        })
    }

    /// Returns true if this event is a relay list
    pub fn is_relay_list(&self) -> bool {
        self.kind == RELAY_LIST_KIND
    }
}

/// Neighbouring relays found in a batch of relay-list events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NeighbourScan {
    /// Sorted, deduplicated relay addresses
    pub relays: Vec<String>,

    /// Events skipped because they were not relay lists
    pub wrong_kind: usize,
}

/// Collects every relay address advertised by a batch of relay-list events
///
/// Events of any other kind are counted and skipped.
pub fn find_neighbours(events: &[Event]) -> NeighbourScan {
    let mut scan = NeighbourScan::default();

    for event in events {
        if !event.is_relay_list() {
            scan.wrong_kind += 1;
            continue;
        }
        scan.relays.extend(event.relay_urls().map(str::to_string));
    }

    scan.relays.sort();
    scan.relays.dedup();
    scan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay_list(pubkey: &str, relays: &[&str]) -> Event {
        Event {
            pubkey: pubkey.to_string(),
            kind: RELAY_LIST_KIND,
            tags: relays
                .iter()
                .map(|r| vec!["r".to_string(), r.to_string()])
                .collect(),
            ..Event::default()
        }
    }

    #[test]
    fn test_relay_urls_reads_r_tags_only() {
        let event = Event {
            kind: RELAY_LIST_KIND,
            tags: vec![
                vec!["r".into(), "wss://a.example".into(), "read".into()],
                vec!["p".into(), "abcdef".into()],
                vec!["r".into()],
                vec![],
                vec!["r".into(), "wss://b.example".into()],
            ],
            ..Event::default()
        };
        let urls: Vec<_> = event.relay_urls().collect();
        assert_eq!(urls, vec!["wss://a.example", "wss://b.example"]);
    }

    #[test]
    fn test_find_neighbours_sorts_and_dedupes() {
        let events = vec![
            relay_list("a", &["wss://c.example", "wss://a.example"]),
            relay_list("b", &["wss://a.example", "wss://b.example"]),
        ];
        let scan = find_neighbours(&events);
        assert_eq!(
            scan.relays,
            vec!["wss://a.example", "wss://b.example", "wss://c.example"]
        );
        assert_eq!(scan.wrong_kind, 0);
    }

    #[test]
    fn test_find_neighbours_skips_other_kinds() {
        let mut note = relay_list("a", &["wss://sneaky.example"]);
        note.kind = 1;
        let events = vec![note, relay_list("b", &["wss://b.example"])];

        let scan = find_neighbours(&events);
        assert_eq!(scan.relays, vec!["wss://b.example"]);
        assert_eq!(scan.wrong_kind, 1);
    }

    #[test]
    fn test_event_deserializes_with_missing_fields() {
        let event: Event =
            serde_json::from_str(r#"{"kind":10002,"tags":[["r","wss://x.example"]]}"#).unwrap();
        assert_eq!(event.kind, RELAY_LIST_KIND);
        assert!(event.pubkey.is_empty());
        assert_eq!(event.relay_urls().count(), 1);
    }
}
