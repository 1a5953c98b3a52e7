//! Merchant client: operations, push dispatch, and the market mirror
//!
//! One [`MerchantClient`] owns one transport connection, the in-memory
//! [`MarketMirror`], the session's authenticated flag, and the subscriber
//! list. All push events and response-driven cache effects funnel through
//! here.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::ClientConfig;
use crate::consts::MERCHANT_SOCKET_URL;
use crate::errors::{Error, Result};
use crate::market::{
    AccountListings, CreateListingsRequest, InventoryItem, Listing, MarketEvent, MarketMirror,
    MarketStats, PurchaseRequest, RemovedListing,
};
use crate::transport::{wire, PushEvent, ResponseEnvelope, Transport, WsTransport};

/// Client for the merchant socket API
///
/// Cheap to clone; clones share the same connection, mirror and session
/// state. Consumers receive notifications by registering an unbounded
/// sender through [`subscribe`](MerchantClient::subscribe).
#[derive(Clone)]
pub struct MerchantClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    mirror: Arc<AsyncMutex<MarketMirror>>,
    authenticated: Arc<AtomicBool>,
    subscribers: Arc<Mutex<Vec<UnboundedSender<MarketEvent>>>>,
}

/// `load_inventory` acknowledgment payload
#[derive(Debug, Deserialize)]
struct InventoryPayload {
    #[serde(default)]
    inventory: Vec<InventoryItem>,
}

impl MerchantClient {
    /// Connect to the merchant service's fixed endpoint
    pub fn connect(config: ClientConfig) -> Self {
        let transport = Arc::new(WsTransport::connect(MERCHANT_SOCKET_URL));
        Self::with_transport(config, transport)
    }

    /// Build a client over an explicit transport
    ///
    /// This is the seam tests and embedders use, typically with
    /// [`MockTransport`](crate::MockTransport).
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let client = Self {
            config,
            transport,
            mirror: Arc::new(AsyncMutex::new(MarketMirror::new())),
            authenticated: Arc::new(AtomicBool::new(false)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        };
        client.spawn_dispatch();
        client
    }

    /// Register a subscriber for market notifications
    pub fn subscribe(&self, sender: UnboundedSender<MarketEvent>) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(sender);
    }

    /// Whether the session has authenticated since the last (re)connect
    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    // ---- mirror snapshots ------------------------------------------------

    /// Snapshot of the mirrored active listing set
    pub async fn listings(&self) -> Vec<Listing> {
        self.mirror.lock().await.active_listings().to_vec()
    }

    /// Current mirrored market aggregates
    pub async fn market_stats(&self) -> MarketStats {
        self.mirror.lock().await.stats()
    }

    /// Total mirrored market value in dollars
    pub async fn market_value(&self) -> f64 {
        self.market_stats().await.value_dollars()
    }

    /// Highest mirrored listing price in dollars
    pub async fn market_max(&self) -> f64 {
        self.market_stats().await.max_dollars()
    }

    /// Snapshot of a client's mirrored sale book, if loaded
    pub async fn client_deposits(&self, steam_id: &str) -> Option<Vec<Listing>> {
        self.mirror
            .lock()
            .await
            .client_deposits(steam_id)
            .map(<[Listing]>::to_vec)
    }

    /// Snapshot of a client's mirrored purchase book, if loaded
    pub async fn client_withdraws(&self, steam_id: &str) -> Option<Vec<Listing>> {
        self.mirror
            .lock()
            .await
            .client_withdraws(steam_id)
            .map(<[Listing]>::to_vec)
    }

    // ---- operations ------------------------------------------------------

    /// Authenticate the session with the configured merchant API key
    pub async fn authenticate(&self) -> Result<Value> {
        require(&self.config.api_key, "Provide a merchant API key to authenticate")?;

        match self.request(wire::AUTHENTICATE, json!({"key": self.config.api_key})).await {
            Ok(envelope) => {
                self.authenticated.store(true, Ordering::SeqCst);
                info!("Authenticated to merchant socket");
                self.emit(MarketEvent::Authenticated);
                Ok(envelope.data)
            }
            // An authenticate rejection is a credentials problem, not a
            // generic remote failure
            Err(Error::RemoteOperation(message)) => Err(Error::Authentication(message)),
            Err(e) => Err(e),
        }
    }

    /// Load a client's external inventory snapshot
    pub async fn load_inventory(&self, steam_id: &str) -> Result<Vec<InventoryItem>> {
        self.ensure_authenticated()?;
        require(steam_id, "Provide a client's SteamID64")?;

        let envelope = self
            .request(wire::LOAD_INVENTORY, json!({"steamid": steam_id}))
            .await?;
        let payload: InventoryPayload = serde_json::from_value(envelope.data)?;
        Ok(payload.inventory)
    }

    /// Fetch the full active-listing snapshot from the server
    ///
    /// With caching enabled this is a full resync: the mirrored active set
    /// is replaced wholesale and the aggregates are recomputed from the
    /// fresh snapshot.
    pub async fn fetch_all_listings(&self) -> Result<Vec<Listing>> {
        self.ensure_authenticated()?;

        let envelope = self.request(wire::LISTINGS_GET, json!({})).await?;
        let listings: Vec<Listing> = serde_json::from_value(envelope.data)?;

        if self.config.cache {
            self.mirror.lock().await.replace_active(listings.clone());
        }
        Ok(listings)
    }

    /// Fetch one client's active deposits and withdraws from the server
    pub async fn fetch_client_listings(&self, steam_id: &str) -> Result<AccountListings> {
        self.ensure_authenticated()?;
        require(steam_id, "Provide a client's SteamID64")?;

        let envelope = self
            .request(wire::LISTINGS_CLIENT, json!({"steamid": steam_id}))
            .await?;
        let books: AccountListings = serde_json::from_value(envelope.data)?;

        if self.config.cache {
            self.mirror.lock().await.replace_client(steam_id, books.clone());
        }
        Ok(books)
    }

    /// List a batch of items for sale on behalf of a client
    pub async fn create_listings(&self, request: CreateListingsRequest) -> Result<Vec<Listing>> {
        self.ensure_authenticated()?;
        require(&request.steam_id, "Provide a client's SteamID64")?;
        require(&request.api_key, "Provide a client's Steam api-key")?;
        require(&request.trade_url, "Provide a client's Steam tradeurl")?;
        if request.items.is_empty() {
            return Err(Error::Validation(
                "Provide at least one item to list".to_string(),
            ));
        }
        for (i, item) in request.items.iter().enumerate() {
            if item.asset_id.trim().is_empty() || item.price == 0 {
                return Err(Error::Validation(format!(
                    "Item at index {i} must carry an assetid and a non-zero price"
                )));
            }
        }

        let payload = serde_json::to_value(&request)?;
        let envelope = self.request(wire::LISTINGS_NEW, payload).await?;
        let listings: Vec<Listing> = serde_json::from_value(envelope.data)?;

        if self.config.cache {
            self.mirror
                .lock()
                .await
                .append_deposits(&request.steam_id, listings.clone());
        }
        Ok(listings)
    }

    /// Cancel a client's listings by asset id
    ///
    /// Returns the server's per-asset cancellation map. Ids the mirror no
    /// longer holds are skipped locally; the server may already have moved
    /// them to purchased or removed.
    pub async fn cancel_listings(
        &self,
        steam_id: &str,
        asset_ids: &[String],
    ) -> Result<HashMap<String, Value>> {
        self.ensure_authenticated()?;
        require(steam_id, "Provide a client's SteamID64")?;
        if asset_ids.is_empty() {
            return Err(Error::Validation(
                "Provide at least one assetid to cancel".to_string(),
            ));
        }

        let envelope = self
            .request(
                wire::LISTINGS_CANCEL,
                json!({"steamid": steam_id, "assetids": asset_ids}),
            )
            .await?;
        let cancelled: HashMap<String, Value> = serde_json::from_value(envelope.data)?;

        if self.config.cache {
            let ids: Vec<String> = cancelled.keys().cloned().collect();
            self.mirror.lock().await.remove_deposits(steam_id, &ids);
        }
        Ok(cancelled)
    }

    /// Purchase an active listing on behalf of a client
    pub async fn purchase_listing(&self, request: PurchaseRequest) -> Result<Listing> {
        self.ensure_authenticated()?;
        require(&request.steam_id, "Provide a client's SteamID64")?;
        require(&request.trade_url, "Provide a client's Steam tradeurl")?;
        require(
            &request.asset_id,
            "Provide the Asset ID of the listing you want to purchase",
        )?;

        let envelope = self
            .request(
                wire::LISTINGS_PURCHASE,
                json!({
                    "steamid": request.steam_id,
                    "tradeUrl": request.trade_url,
                    "item": {"assetid": request.asset_id},
                }),
            )
            .await?;
        let listing: Listing = serde_json::from_value(envelope.data)?;

        if self.config.cache {
            self.mirror
                .lock()
                .await
                .push_withdraw(&request.steam_id, listing.clone());
        }
        Ok(listing)
    }

    /// Confirm a pending sale, typically in response to a
    /// [`ListingUpdated`](MarketEvent::ListingUpdated) notification whose
    /// status [`needs_confirmation`](crate::ListingStatus::needs_confirmation)
    pub async fn confirm_listing(&self, steam_id: &str, asset_id: &str) -> Result<String> {
        self.ensure_authenticated()?;
        require(steam_id, "Provide a client's SteamID64")?;
        require(
            asset_id,
            "Provide the Asset ID of the listing you want to confirm",
        )?;

        let envelope = self
            .request(
                wire::LISTINGS_CONFIRM,
                json!({"steamid": steam_id, "assetid": asset_id}),
            )
            .await?;
        Ok(envelope.message.unwrap_or_default())
    }

    // ---- internals -------------------------------------------------------

    fn ensure_authenticated(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(Error::NotAuthenticated)
        }
    }

    /// Emit a request bounded by the configured acknowledgment timeout
    async fn request(&self, event: &str, payload: Value) -> Result<ResponseEnvelope> {
        match tokio::time::timeout(
            self.config.request_timeout,
            self.transport.request(event, payload),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                event: event.to_string(),
            }),
        }
    }

    fn emit(&self, event: MarketEvent) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|sender| sender.send(event.clone()).is_ok());
    }

    fn spawn_dispatch(&self) {
        let (tx, mut rx) = unbounded_channel();
        self.transport.subscribe(tx);

        let client = self.clone();
        tokio::spawn(async move {
            while let Some(push) = rx.recv().await {
                client.handle_push(push).await;
            }
            debug!("Push channel closed; dispatch task exiting");
        });
    }

    /// The single event-dispatch path: every push mutates the mirror (when
    /// caching) and is forwarded to subscribers
    async fn handle_push(&self, push: PushEvent) {
        match push {
            PushEvent::Connected => {
                self.emit(MarketEvent::Connected);
            }
            PushEvent::Disconnected => {
                self.authenticated.store(false, Ordering::SeqCst);
                self.emit(MarketEvent::Disconnected);

                if self.config.reconnect {
                    // Fire-and-forget: the transport queues the frame until
                    // the socket is back; failures only surface through the
                    // normal authenticate error path
                    let client = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = client.authenticate().await {
                            warn!("Re-authentication after disconnect failed: {e}");
                        }
                    });
                }
            }
            PushEvent::Error(message) => {
                error!("Merchant socket error: {message}");
                self.emit(MarketEvent::Error(message));
            }
            PushEvent::NewListing(listing) => {
                if self.config.cache {
                    self.mirror.lock().await.insert_listing(listing.clone());
                }
                self.emit(MarketEvent::ListingAdded(listing));
            }
            PushEvent::ListingRemoved { asset_id } => {
                let evicted = if self.config.cache {
                    self.mirror.lock().await.remove_listing(&asset_id)
                } else {
                    None
                };

                let removed = match evicted {
                    Some(listing) => RemovedListing::Listing(listing),
                    None => RemovedListing::AssetId(asset_id),
                };
                self.emit(MarketEvent::ListingRemoved(removed));
            }
            PushEvent::ListingStatus(listing) => {
                let owner = if self.config.cache {
                    self.mirror.lock().await.update_status(&listing)
                } else {
                    None
                };

                match owner {
                    Some(steam_id) => {
                        let mut enriched = listing;
                        enriched.steam_id = Some(steam_id.clone());
                        self.emit(MarketEvent::ListingUpdated {
                            listing: enriched,
                            steam_id: Some(steam_id),
                        });
                    }
                    // Degraded notification: the raw payload is all there is
                    None => self.emit(MarketEvent::ListingUpdated {
                        listing,
                        steam_id: None,
                    }),
                }
            }
        }
    }
}

fn require(value: &str, message: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(message.to_string()));
    }
    Ok(())
}
