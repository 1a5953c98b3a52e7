//! Market Mirror Module
//!
//! Local, in-memory mirror of the marketplace's server-authoritative state:
//! the active listing set, per-client deposit/withdraw books, and the
//! aggregates derived from them.
//!
//! The mirror is passive. It is mutated only from the client's single
//! event-dispatch path (push events) and by the cache effects of the
//! client's own request/response operations, so it carries no locking of
//! its own. Consumers observe it through snapshots on
//! [`MerchantClient`](crate::MerchantClient) and through the
//! [`MarketEvent`] notification stream.

mod events;
mod market;
mod types;

pub use events::{MarketEvent, RemovedListing};
pub use market::MarketMirror;
pub use types::{
    AccountListings, CreateListingsRequest, InventoryItem, Listing, ListingDraft, ListingKind,
    ListingStatus, MarketStats, PurchaseRequest,
};
