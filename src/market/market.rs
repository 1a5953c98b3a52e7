//! In-memory mirror of server-authoritative market state
//!
//! Owns the active listing set, the per-client deposit/withdraw books and
//! the derived market aggregates. All mutation happens on the client's
//! single event-dispatch path, so the mirror itself is free of locking.

use std::collections::HashMap;

use super::types::{AccountListings, Listing, ListingKind, MarketStats};

/// Local cache of active listings and client order books
///
/// Aggregates are maintained incrementally: `total_value` and `max_price`
/// are both adjusted on insertion and removal, and both recomputed from
/// scratch when the active set is replaced wholesale by a resync.
#[derive(Debug, Default)]
pub struct MarketMirror {
    /// Active market-wide listings, in arrival order
    listings: Vec<Listing>,
    /// Derived aggregates over `listings`
    stats: MarketStats,
    /// Per-client sale books, keyed by SteamID64
    deposits: HashMap<String, Vec<Listing>>,
    /// Per-client purchase books, keyed by SteamID64
    withdraws: HashMap<String, Vec<Listing>>,
}

impl MarketMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the active listing set
    pub fn active_listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Current market aggregates
    pub fn stats(&self) -> MarketStats {
        self.stats
    }

    /// A client's known sale book, if one has been loaded
    pub fn client_deposits(&self, steam_id: &str) -> Option<&[Listing]> {
        self.deposits.get(steam_id).map(Vec::as_slice)
    }

    /// A client's known purchase book, if one has been loaded
    pub fn client_withdraws(&self, steam_id: &str) -> Option<&[Listing]> {
        self.withdraws.get(steam_id).map(Vec::as_slice)
    }

    /// Add a listing to the active set and fold it into the aggregates
    pub fn insert_listing(&mut self, listing: Listing) {
        if listing.price > self.stats.max_price {
            self.stats.max_price = listing.price;
        }
        self.stats.total_value += listing.price;
        self.listings.push(listing);
    }

    /// Remove a listing from the active set by asset id
    ///
    /// Unknown ids are a no-op, which makes duplicate or out-of-order
    /// removal pushes idempotent. Returns the evicted listing so the caller
    /// can forward it in the removal notification.
    pub fn remove_listing(&mut self, asset_id: &str) -> Option<Listing> {
        let index = self.listings.iter().position(|l| l.asset_id == asset_id)?;
        let listing = self.listings.remove(index);

        self.stats.total_value = self.stats.total_value.saturating_sub(listing.price);
        if listing.price == self.stats.max_price {
            self.stats.max_price = self.max_active_price();
        }

        Some(listing)
    }

    /// Apply a status push to whichever client book holds the listing
    ///
    /// Books are scanned first-match-wins; asset ids are globally unique so
    /// at most one book entry can match. Returns the owning client's steam
    /// id when the listing was found and replaced, `None` when the payload
    /// named no book side or no book holds the asset.
    pub fn update_status(&mut self, listing: &Listing) -> Option<String> {
        let book = match listing.kind? {
            ListingKind::Deposit => &mut self.deposits,
            ListingKind::Withdraw => &mut self.withdraws,
        };

        for (steam_id, entries) in book.iter_mut() {
            if let Some(slot) = entries.iter_mut().find(|l| l.asset_id == listing.asset_id) {
                *slot = listing.clone();
                return Some(steam_id.clone());
            }
        }

        None
    }

    /// Replace the active set wholesale after a full resync
    pub fn replace_active(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
        self.stats = MarketStats {
            max_price: self.max_active_price(),
            total_value: self.listings.iter().map(|l| l.price).sum(),
        };
    }

    /// Replace one client's books after a per-client resync
    pub fn replace_client(&mut self, steam_id: &str, books: AccountListings) {
        self.deposits.insert(steam_id.to_string(), books.deposits);
        self.withdraws.insert(steam_id.to_string(), books.withdraws);
    }

    /// Append freshly created listings to a client's sale book
    pub fn append_deposits(&mut self, steam_id: &str, listings: Vec<Listing>) {
        self.deposits
            .entry(steam_id.to_string())
            .or_default()
            .extend(listings);
    }

    /// Drop cancelled asset ids from a client's sale book
    ///
    /// Ids with no local entry are skipped: the server may already have
    /// moved those items to purchased or removed.
    pub fn remove_deposits(&mut self, steam_id: &str, asset_ids: &[String]) {
        if let Some(entries) = self.deposits.get_mut(steam_id) {
            entries.retain(|l| !asset_ids.contains(&l.asset_id));
        }
    }

    /// Record a purchased listing in a client's purchase book
    pub fn push_withdraw(&mut self, steam_id: &str, listing: Listing) {
        self.withdraws
            .entry(steam_id.to_string())
            .or_default()
            .push(listing);
    }

    fn max_active_price(&self) -> u64 {
        self.listings.iter().map(|l| l.price).max().unwrap_or(0)
    }
}
