//! WebSocket transport for the merchant socket service
//!
//! Maintains one persistent connection against the fixed endpoint,
//! reconnecting with capped exponential backoff. Outbound frames are queued
//! through a channel that survives reconnects, so requests emitted while
//! the socket is down are flushed as soon as it is back; their
//! acknowledgments are bounded by the caller's request timeout, never by
//! the connection's fate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{InboundFrame, PushEvent, RequestFrame, ResponseEnvelope, Transport};
use crate::consts::{RECONNECT_BASE_DELAY_MS, RECONNECT_MAX_DELAY_MS};
use crate::errors::{Error, Result};

type AckSender = oneshot::Sender<Result<ResponseEnvelope>>;

/// Transport state shared between the public handle and the socket task
struct Shared {
    url: String,
    next_id: AtomicU64,
    /// Outstanding acknowledgments keyed by correlation id
    pending: Mutex<HashMap<u64, AckSender>>,
    subscribers: Mutex<Vec<UnboundedSender<PushEvent>>>,
    outbound_tx: UnboundedSender<String>,
}

/// [`Transport`] implementation over tokio-tungstenite
pub struct WsTransport {
    shared: Arc<Shared>,
}

impl WsTransport {
    /// Open a transport against the given endpoint
    ///
    /// The connection is established (and re-established after failures)
    /// by a background task; readiness and loss are reported to push
    /// subscribers as [`PushEvent::Connected`] / [`PushEvent::Disconnected`].
    pub fn connect(url: impl Into<String>) -> Self {
        let (outbound_tx, outbound_rx) = unbounded_channel();
        let shared = Arc::new(Shared {
            url: url.into(),
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            outbound_tx,
        });

        tokio::spawn(run_socket(Arc::clone(&shared), outbound_rx));

        Self { shared }
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn request(&self, event: &str, payload: Value) -> Result<ResponseEnvelope> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = RequestFrame {
            event,
            id,
            data: payload,
        };
        let text = serde_json::to_string(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.shared
            .pending
            .lock()
            .expect("pending map poisoned")
            .insert(id, tx);

        if self.shared.outbound_tx.send(text).is_err() {
            self.shared
                .pending
                .lock()
                .expect("pending map poisoned")
                .remove(&id);
            return Err(Error::ChannelClosed);
        }
        debug!("Request '{event}' sent with correlation id {id}");

        rx.await.map_err(|_| Error::ChannelClosed)?
    }

    fn subscribe(&self, sender: UnboundedSender<PushEvent>) {
        self.shared
            .subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(sender);
    }
}

impl Shared {
    fn broadcast(&self, push: PushEvent) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|sender| sender.send(push.clone()).is_ok());
    }

    fn handle_text(&self, text: &str) {
        let frame: InboundFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping undecodable frame: {e}");
                return;
            }
        };

        if let Some(id) = frame.ack {
            let Some(sender) = self
                .pending
                .lock()
                .expect("pending map poisoned")
                .remove(&id)
            else {
                // Late ack for a request that already timed out
                debug!("Dropping acknowledgment for unknown correlation id {id}");
                return;
            };

            let result = match frame.error {
                Some(err) => Err(Error::RemoteOperation(err.into_message())),
                None => Ok(ResponseEnvelope {
                    data: frame.data,
                    message: frame.message,
                }),
            };
            let _ = sender.send(result);
            return;
        }

        if let Some(event) = frame.event {
            if let Some(push) = PushEvent::parse(&event, frame.data) {
                self.broadcast(push);
            }
            return;
        }

        warn!("Dropping frame with neither ack nor event");
    }
}

/// Connection lifecycle loop: connect, pump, backoff, repeat
async fn run_socket(shared: Arc<Shared>, mut outbound_rx: UnboundedReceiver<String>) {
    let mut attempt = 0u32;

    loop {
        match connect_async(&shared.url).await {
            Ok((stream, _)) => {
                attempt = 0;
                info!("Connected to merchant socket at {}", shared.url);
                shared.broadcast(PushEvent::Connected);

                let (mut write, mut read) = stream.split();
                let reason = loop {
                    tokio::select! {
                        msg = read.next() => match msg {
                            Some(Ok(Message::Text(text))) => shared.handle_text(&text),
                            Some(Ok(Message::Ping(data))) => {
                                if let Err(e) = write.send(Message::Pong(data)).await {
                                    break e.to_string();
                                }
                            }
                            Some(Ok(Message::Close(_))) => break "closed by server".to_string(),
                            Some(Ok(_)) => {}
                            Some(Err(e)) => break e.to_string(),
                            None => break "stream ended".to_string(),
                        },
                        frame = outbound_rx.recv() => match frame {
                            Some(text) => {
                                if let Err(e) = write.send(Message::Text(text)).await {
                                    break e.to_string();
                                }
                            }
                            // Transport handle dropped; shut the task down
                            None => return,
                        },
                    }
                };

                warn!("Merchant socket disconnected: {reason}");
                shared.broadcast(PushEvent::Disconnected);
            }
            Err(e) => {
                error!("Failed to connect to merchant socket: {e}");
                shared.broadcast(PushEvent::Error(e.to_string()));
            }
        }

        attempt += 1;
        let delay = backoff_delay(attempt);
        warn!(
            "Reconnecting to merchant socket in {}ms (attempt {attempt})",
            delay.as_millis()
        );
        tokio::time::sleep(delay).await;
    }
}

/// Exponential backoff: base * 2^(attempt-1), capped
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let delay = RECONNECT_BASE_DELAY_MS.saturating_mul(1u64 << exponent);
    Duration::from_millis(delay.min(RECONNECT_MAX_DELAY_MS))
}
