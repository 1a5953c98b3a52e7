#![deny(unreachable_pub)]
mod client;
pub mod config;
mod consts;
mod errors;
pub mod market;
mod transport;

pub use client::MerchantClient;
pub use config::{ClientConfig, Settings};
pub use consts::{DEFAULT_REQUEST_TIMEOUT_MS, MERCHANT_SOCKET_URL};
pub use errors::{Error, Result};
pub use market::{
    AccountListings, CreateListingsRequest, InventoryItem, Listing, ListingDraft, ListingKind,
    ListingStatus, MarketEvent, MarketMirror, MarketStats, PurchaseRequest, RemovedListing,
};
pub use transport::{MockTransport, PushEvent, ResponseEnvelope, Transport, WsTransport};
