//! Nostr protocol types used by the crawler
//!
//! This module covers the small part of Nostr the crawler speaks:
//! - NIP-01 events and relay frames (`EVENT`, `EOSE`, `CLOSED`, `NOTICE`, `AUTH`)
//! - NIP-11 relay information documents
//! - NIP-65 relay lists (kind 10002) and their `r` tags

mod event;
mod info;
mod message;

pub use event::{find_neighbours, Event, NeighbourScan, RELAY_LIST_KIND};
pub use info::InfoDocument;
pub use message::{relay_list_request, FrameError, RelayMessage};
