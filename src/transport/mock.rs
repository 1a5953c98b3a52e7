//! Scripted transport for tests
//!
//! Plays the merchant service: responses are scripted per request event,
//! pushes are injected by hand, and every emitted request is recorded.
//! Shipped as a public citizen so SDK consumers can drive their own code
//! against it without a live socket.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use super::{PushEvent, ResponseEnvelope, Transport};
use crate::errors::{Error, Result};

type Responder = Box<dyn Fn(&Value) -> Result<ResponseEnvelope> + Send + Sync>;

/// In-memory [`Transport`] with scripted acknowledgments
#[derive(Default)]
pub struct MockTransport {
    responders: Mutex<HashMap<String, Responder>>,
    requests: Mutex<Vec<(String, Value)>>,
    subscribers: Mutex<Vec<UnboundedSender<PushEvent>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an arbitrary responder for a request event
    pub fn respond_with<F>(&self, event: impl Into<String>, responder: F)
    where
        F: Fn(&Value) -> Result<ResponseEnvelope> + Send + Sync + 'static,
    {
        self.responders
            .lock()
            .expect("responder map poisoned")
            .insert(event.into(), Box::new(responder));
    }

    /// Script a successful acknowledgment carrying `data`
    pub fn respond_ok(&self, event: impl Into<String>, data: Value) {
        self.respond_with(event, move |_| {
            Ok(ResponseEnvelope {
                data: data.clone(),
                message: None,
            })
        });
    }

    /// Script a successful acknowledgment carrying `data` and a status message
    pub fn respond_ok_with_message(
        &self,
        event: impl Into<String>,
        data: Value,
        message: impl Into<String>,
    ) {
        let message = message.into();
        self.respond_with(event, move |_| {
            Ok(ResponseEnvelope {
                data: data.clone(),
                message: Some(message.clone()),
            })
        });
    }

    /// Script a server-side rejection with the given message
    pub fn respond_err(&self, event: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        self.respond_with(event, move |_| {
            Err(Error::RemoteOperation(message.clone()))
        });
    }

    /// Inject a push event, as if the server had sent it
    pub fn push(&self, push: PushEvent) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|sender| sender.send(push.clone()).is_ok());
    }

    /// Every request emitted so far, in order
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    /// How many requests were emitted for one event name
    pub fn request_count(&self, event: &str) -> usize {
        self.requests
            .lock()
            .expect("request log poisoned")
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, event: &str, payload: Value) -> Result<ResponseEnvelope> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push((event.to_string(), payload.clone()));

        let responders = self.responders.lock().expect("responder map poisoned");
        match responders.get(event) {
            Some(responder) => responder(&payload),
            None => Err(Error::Transport(format!(
                "no scripted response for '{event}'"
            ))),
        }
    }

    fn subscribe(&self, sender: UnboundedSender<PushEvent>) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push(sender);
    }
}
