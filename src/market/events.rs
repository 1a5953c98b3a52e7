//! Notifications delivered to market subscribers
//!
//! Every push event and every derived mirror mutation is forwarded to
//! subscribers as one of these variants, delivered over an unbounded
//! channel registered with [`subscribe`](crate::MerchantClient::subscribe).

use serde::{Deserialize, Serialize};

use super::types::Listing;

/// Payload of a listing-removed notification
///
/// When the mirror is caching it can hand back the full evicted listing;
/// with caching disabled (or when the id was never cached) only the raw
/// wire identifier is available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RemovedListing {
    /// The evicted listing, available when the mirror held it
    Listing(Listing),
    /// Raw asset id from the wire
    AssetId(String),
}

impl RemovedListing {
    /// Asset id of the removed listing, whichever form was delivered
    pub fn asset_id(&self) -> &str {
        match self {
            RemovedListing::Listing(listing) => &listing.asset_id,
            RemovedListing::AssetId(asset_id) => asset_id,
        }
    }
}

/// Notification stream of a [`MerchantClient`](crate::MerchantClient)
#[derive(Debug, Clone)]
pub enum MarketEvent {
    /// Transport established (or re-established) its connection
    Connected,
    /// Transport lost its connection; the session is unauthenticated again
    Disconnected,
    /// Transport-level error not tied to any in-flight request
    Error(String),
    /// The session authenticated successfully
    Authenticated,
    /// A new listing appeared on the market
    ListingAdded(Listing),
    /// A listing left the market
    ListingRemoved(RemovedListing),
    /// One listing's status changed. `steam_id` names the owning client
    /// when the mirror could locate the listing in a client book; `None`
    /// means the raw payload is all there is.
    ListingUpdated {
        listing: Listing,
        steam_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_listing_asset_id() {
        let full = RemovedListing::Listing(Listing::new("42", 100));
        assert_eq!(full.asset_id(), "42");

        let bare = RemovedListing::AssetId("42".to_string());
        assert_eq!(bare.asset_id(), "42");
    }
}
