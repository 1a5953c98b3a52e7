//! Market Watch Binary
//!
//! Connects to the merchant socket, authenticates, and prints every market
//! notification as it arrives.
//!
//! ## Setup
//!
//! 1. Create a `.env` file in the project root:
//!    ```
//!    SKINCRIB_MERCHANT__API_KEY=your-merchant-key
//!    ```
//!
//! 2. Run the watcher:
//!    ```bash
//!    cargo run --bin market_watch -- --config config.toml
//!    ```

use std::env;

use log::{error, info};
use tokio::sync::mpsc::unbounded_channel;

use skincrib_merchant_sdk::{ClientConfig, MarketEvent, MerchantClient, Settings};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load .env file
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from: {}", path.display()),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Parse arguments
    let args: Vec<String> = env::args().collect();
    let config = if args.len() > 2 && args[1] == "--config" {
        match Settings::new(&args[2]) {
            Ok(settings) => ClientConfig::from(&settings.merchant),
            Err(e) => {
                error!("Failed to load config: {e}");
                return;
            }
        }
    } else {
        let api_key = match env::var("SKINCRIB_MERCHANT__API_KEY") {
            Ok(key) => key,
            Err(_) => {
                error!("SKINCRIB_MERCHANT__API_KEY not set and no --config given");
                return;
            }
        };
        ClientConfig::new(api_key)
    };

    let client = MerchantClient::connect(config);
    let (tx, mut rx) = unbounded_channel();
    client.subscribe(tx);

    if let Err(e) = client.authenticate().await {
        error!("Failed to authenticate: {e}");
        return;
    }

    while let Some(event) = rx.recv().await {
        match event {
            MarketEvent::Connected => info!("Connected to merchant socket"),
            MarketEvent::Disconnected => info!("Disconnected from merchant socket"),
            MarketEvent::Authenticated => info!("Session authenticated"),
            MarketEvent::Error(message) => error!("Socket error: {message}"),
            MarketEvent::ListingAdded(listing) => {
                info!(
                    "Listing added: {} at ${:.2} (market max ${:.2}, value ${:.2})",
                    listing.asset_id,
                    listing.price_dollars(),
                    client.market_max().await,
                    client.market_value().await,
                );
            }
            MarketEvent::ListingRemoved(removed) => {
                info!("Listing removed: {}", removed.asset_id());
            }
            MarketEvent::ListingUpdated { listing, steam_id } => {
                info!(
                    "Listing updated: {} -> {:?} (client: {})",
                    listing.asset_id,
                    listing.status,
                    steam_id.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }
}
