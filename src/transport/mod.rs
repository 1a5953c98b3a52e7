//! Transport seam between the client and the merchant socket service
//!
//! The service delivers named push events and acknowledges named requests
//! with a single `(error, response)` style callback. This module pins that
//! contract down as the [`Transport`] trait plus the typed frames crossing
//! it, so the client logic is independent of the concrete socket
//! implementation ([`WsTransport`]) and testable against
//! [`MockTransport`].

mod mock;
mod ws;

pub use mock::MockTransport;
pub use ws::WsTransport;

use async_trait::async_trait;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use crate::errors::Result;
use crate::market::Listing;

/// Wire names of the request events this SDK produces. The names are the
/// external service's contract.
pub(crate) mod wire {
    pub(crate) const AUTHENTICATE: &str = "authenticate";
    pub(crate) const LOAD_INVENTORY: &str = "user:loadInventory";
    pub(crate) const LISTINGS_GET: &str = "p2p:listings:get";
    pub(crate) const LISTINGS_CLIENT: &str = "p2p:listings:client";
    pub(crate) const LISTINGS_NEW: &str = "p2p:listings:new";
    pub(crate) const LISTINGS_CANCEL: &str = "p2p:listings:cancel";
    pub(crate) const LISTINGS_PURCHASE: &str = "p2p:listings:purchase";
    pub(crate) const LISTINGS_CONFIRM: &str = "p2p:listings:confirm";

    pub(crate) const PUSH_LISTINGS_NEW: &str = "p2p:listings:new";
    pub(crate) const PUSH_LISTINGS_REMOVED: &str = "p2p:listings:removed";
    pub(crate) const PUSH_LISTINGS_STATUS: &str = "p2p:listings:status";
    pub(crate) const PUSH_ERROR: &str = "error";
}

/// Acknowledgment payload of a successful request
///
/// `data` carries the result; `message` carries the server's human-readable
/// status text when it sends one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
}

/// Outbound request frame: named event, correlation id, payload
#[derive(Debug, Serialize)]
pub(crate) struct RequestFrame<'a> {
    pub(crate) event: &'a str,
    pub(crate) id: u64,
    pub(crate) data: Value,
}

/// Error half of an acknowledgment
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    pub(crate) message: Option<String>,
}

impl WireError {
    pub(crate) fn into_message(self) -> String {
        self.message
            .unwrap_or_else(|| "unspecified server error".to_string())
    }
}

/// Inbound frame: either an acknowledgment (`ack` set) or a push (`event`
/// set). Anything else is a protocol violation and is dropped at the
/// boundary.
#[derive(Debug, Deserialize)]
pub(crate) struct InboundFrame {
    #[serde(default)]
    pub(crate) ack: Option<u64>,
    #[serde(default)]
    pub(crate) event: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<WireError>,
    #[serde(default)]
    pub(crate) data: Value,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// Push events crossing the transport boundary, already parsed and
/// validated. Duck-typed wire payloads stop here.
#[derive(Debug, Clone)]
pub enum PushEvent {
    /// The socket (re-)established its connection
    Connected,
    /// The socket lost its connection
    Disconnected,
    /// Server-side error push, or a socket-level failure
    Error(String),
    /// `p2p:listings:new`
    NewListing(Listing),
    /// `p2p:listings:removed`
    ListingRemoved { asset_id: String },
    /// `p2p:listings:status`
    ListingStatus(Listing),
}

/// Identifier field of a removal push
#[derive(Debug, Deserialize)]
struct RemovedPayload {
    #[serde(rename = "assetid")]
    asset_id: String,
}

impl PushEvent {
    /// Parse a named push into its typed variant
    ///
    /// Unknown event names and malformed payloads yield `None`; both are
    /// logged and dropped rather than surfaced to consumers.
    pub(crate) fn parse(event: &str, data: Value) -> Option<PushEvent> {
        let parsed = match event {
            wire::PUSH_LISTINGS_NEW => {
                serde_json::from_value(data).map(PushEvent::NewListing)
            }
            wire::PUSH_LISTINGS_REMOVED => serde_json::from_value(data)
                .map(|RemovedPayload { asset_id }| PushEvent::ListingRemoved { asset_id }),
            wire::PUSH_LISTINGS_STATUS => {
                serde_json::from_value(data).map(PushEvent::ListingStatus)
            }
            wire::PUSH_ERROR => {
                // Error pushes arrive both as bare strings and as objects
                // with a message field
                let message = match data {
                    Value::String(s) => s,
                    Value::Object(ref map) => map
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| data.to_string()),
                    other => other.to_string(),
                };
                return Some(PushEvent::Error(message));
            }
            other => {
                log::debug!("Ignoring unknown push event '{other}'");
                return None;
            }
        };

        match parsed {
            Ok(push) => Some(push),
            Err(e) => {
                warn!("Dropping malformed '{event}' push: {e}");
                None
            }
        }
    }
}

/// Persistent channel to the merchant service
///
/// Implementations deliver pushes to every registered subscriber and pair
/// each emitted request with exactly one acknowledgment.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Emit a named request and await its acknowledgment
    ///
    /// A server-side rejection surfaces as
    /// [`Error::RemoteOperation`](crate::Error::RemoteOperation) with the
    /// server's message verbatim.
    async fn request(&self, event: &str, payload: Value) -> Result<ResponseEnvelope>;

    /// Register a subscriber for push events
    fn subscribe(&self, sender: UnboundedSender<PushEvent>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_new_listing_push() {
        let push = PushEvent::parse(
            wire::PUSH_LISTINGS_NEW,
            json!({"assetid": "A", "price": 500}),
        );
        match push {
            Some(PushEvent::NewListing(listing)) => {
                assert_eq!(listing.asset_id, "A");
                assert_eq!(listing.price, 500);
            }
            other => panic!("Expected NewListing, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_removed_push() {
        let push = PushEvent::parse(wire::PUSH_LISTINGS_REMOVED, json!({"assetid": "B"}));
        match push {
            Some(PushEvent::ListingRemoved { asset_id }) => assert_eq!(asset_id, "B"),
            other => panic!("Expected ListingRemoved, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_push_variants() {
        match PushEvent::parse(wire::PUSH_ERROR, json!("rate limited")) {
            Some(PushEvent::Error(msg)) => assert_eq!(msg, "rate limited"),
            other => panic!("Expected Error, got {other:?}"),
        }

        match PushEvent::parse(wire::PUSH_ERROR, json!({"message": "bad frame"})) {
            Some(PushEvent::Error(msg)) => assert_eq!(msg, "bad frame"),
            other => panic!("Expected Error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_and_unknown_pushes_are_dropped() {
        // Missing required assetid
        assert!(PushEvent::parse(wire::PUSH_LISTINGS_REMOVED, json!({})).is_none());
        // Unknown event name
        assert!(PushEvent::parse("p2p:trades:new", json!({})).is_none());
    }

    #[test]
    fn test_inbound_frame_shapes() {
        let ack: InboundFrame =
            serde_json::from_str(r#"{"ack": 3, "data": {"ok": true}, "message": "done"}"#)
                .unwrap();
        assert_eq!(ack.ack, Some(3));
        assert!(ack.error.is_none());
        assert_eq!(ack.message.as_deref(), Some("done"));

        let push: InboundFrame =
            serde_json::from_str(r#"{"event": "p2p:listings:removed", "data": {"assetid": "9"}}"#)
                .unwrap();
        assert_eq!(push.event.as_deref(), Some("p2p:listings:removed"));
        assert!(push.ack.is_none());
    }
}
