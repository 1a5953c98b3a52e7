//! Core data types for the merchant market

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of a client's book a listing sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListingKind {
    /// An item the client has listed for sale
    #[serde(rename = "deposits")]
    Deposit,
    /// An item the client has purchased off the market
    #[serde(rename = "withdraws")]
    Withdraw,
}

/// Lifecycle status of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Listed and purchasable
    #[default]
    Active,
    /// A buyer committed; the seller must confirm before the trade is sent
    SellConfirmation,
    /// Trade offer sent to the buyer
    TradeSent,
    /// Trade accepted, listing settled
    Completed,
    Cancelled,
    /// Status value this SDK version does not know about
    #[serde(other)]
    Unknown,
}

impl ListingStatus {
    /// True when the consumer is expected to call
    /// [`confirm_listing`](crate::MerchantClient::confirm_listing)
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, ListingStatus::SellConfirmation)
    }
}

/// A single item offered for trade on the marketplace
///
/// `asset_id` is the canonical identity key: removal and status pushes, as
/// well as cancel/purchase/confirm requests, all address listings by asset
/// id, which the service guarantees to be globally unique. The
/// server-assigned listing `id` is carried when the server sends one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Server-assigned listing identifier, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Steam asset identifier of the item
    #[serde(rename = "assetid")]
    pub asset_id: String,
    /// Market hash name of the item
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub market_hash_name: Option<String>,
    /// Price in minor currency units (cents)
    pub price: u64,
    #[serde(default)]
    pub status: ListingStatus,
    /// Book side, present on status pushes and client book snapshots
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ListingKind>,
    /// SteamID64 of the owning client, when the server includes it
    #[serde(rename = "steamid", default, skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,
    #[serde(rename = "listedAt", default, skip_serializing_if = "Option::is_none")]
    pub listed_at: Option<DateTime<Utc>>,
}

impl Listing {
    /// Create a minimal active listing
    pub fn new(asset_id: impl Into<String>, price: u64) -> Self {
        Self {
            id: None,
            asset_id: asset_id.into(),
            market_hash_name: None,
            price,
            status: ListingStatus::Active,
            kind: None,
            steam_id: None,
            listed_at: None,
        }
    }

    /// Price in major currency units (dollars)
    pub fn price_dollars(&self) -> f64 {
        self.price as f64 / 100.0
    }
}

/// Aggregate statistics over the active listing set
///
/// Both values are maintained incrementally as listings come and go, and
/// recomputed from scratch when the active set is replaced wholesale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStats {
    /// Highest price among active listings, 0 when the market is empty
    pub max_price: u64,
    /// Sum of prices over all active listings
    pub total_value: u64,
}

impl MarketStats {
    /// Highest active price in dollars
    pub fn max_dollars(&self) -> f64 {
        self.max_price as f64 / 100.0
    }

    /// Total active market value in dollars
    pub fn value_dollars(&self) -> f64 {
        self.total_value as f64 / 100.0
    }
}

/// An item in a client's external inventory, as returned by `load_inventory`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    #[serde(rename = "assetid")]
    pub asset_id: String,
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub market_hash_name: Option<String>,
    /// Suggested price in minor currency units
    #[serde(default)]
    pub price: u64,
    /// Whether the service accepts this item for listing
    #[serde(default)]
    pub accepted: bool,
}

/// A client's current books, as returned by `fetch_client_listings`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountListings {
    #[serde(default)]
    pub deposits: Vec<Listing>,
    #[serde(default)]
    pub withdraws: Vec<Listing>,
}

/// One item of a create-listings batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingDraft {
    #[serde(rename = "assetid")]
    pub asset_id: String,
    /// Asking price in minor currency units
    pub price: u64,
    /// Percentage added on top of the suggested price
    #[serde(rename = "percentIncrease")]
    pub percent_increase: f64,
}

impl ListingDraft {
    pub fn new(asset_id: impl Into<String>, price: u64, percent_increase: f64) -> Self {
        Self {
            asset_id: asset_id.into(),
            price,
            percent_increase,
        }
    }
}

/// Input to [`create_listings`](crate::MerchantClient::create_listings)
#[derive(Debug, Clone, Serialize)]
pub struct CreateListingsRequest {
    /// SteamID64 of the selling client
    #[serde(rename = "steamid")]
    pub steam_id: String,
    /// The client's Steam API key
    #[serde(rename = "apiKey")]
    pub api_key: String,
    /// The client's Steam trade URL
    #[serde(rename = "tradeUrl")]
    pub trade_url: String,
    pub items: Vec<ListingDraft>,
}

/// Input to [`purchase_listing`](crate::MerchantClient::purchase_listing)
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    /// SteamID64 of the buying client
    pub steam_id: String,
    /// Trade URL the purchased item should be routed to
    pub trade_url: String,
    /// Asset id of the listing being bought
    pub asset_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_wire_shape() {
        let json = r#"{
            "id": "L-1001",
            "assetid": "31230210",
            "name": "AK-47 | Redline (Field-Tested)",
            "price": 1250,
            "status": "sell_confirmation",
            "type": "deposits",
            "steamid": "76561198000000000"
        }"#;

        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.asset_id, "31230210");
        assert_eq!(listing.price, 1250);
        assert_eq!(listing.status, ListingStatus::SellConfirmation);
        assert!(listing.status.needs_confirmation());
        assert_eq!(listing.kind, Some(ListingKind::Deposit));
        assert_eq!(listing.steam_id.as_deref(), Some("76561198000000000"));
        assert_eq!(listing.price_dollars(), 12.50);
    }

    #[test]
    fn test_listing_minimal_payload() {
        // Push payloads frequently omit everything but the identity and price
        let listing: Listing =
            serde_json::from_str(r#"{"assetid": "555", "price": 900}"#).unwrap();
        assert_eq!(listing.asset_id, "555");
        assert_eq!(listing.status, ListingStatus::Active);
        assert!(listing.kind.is_none());
        assert!(listing.id.is_none());
    }

    #[test]
    fn test_unknown_status_does_not_fail_parsing() {
        let listing: Listing =
            serde_json::from_str(r#"{"assetid": "1", "price": 5, "status": "escrow_hold"}"#)
                .unwrap();
        assert_eq!(listing.status, ListingStatus::Unknown);
    }

    #[test]
    fn test_market_stats_dollars() {
        let stats = MarketStats {
            max_price: 900,
            total_value: 1400,
        };
        assert_eq!(stats.max_dollars(), 9.0);
        assert_eq!(stats.value_dollars(), 14.0);
    }

    #[test]
    fn test_listing_draft_serializes_camel_case() {
        let draft = ListingDraft::new("42", 1000, 5.0);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["assetid"], "42");
        assert_eq!(json["percentIncrease"], 5.0);
    }
}
