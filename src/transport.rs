//! # Feature: Messaging Transport
//!
//! Named-event channel between the client and the chat server. The controller only
//! needs "emit event with payload" and "subscribe to event"; the wire protocol stays
//! behind the `Transport` trait.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: `HttpTransport` accepts envelope lists so one request can fan out several events
//! - 1.0.0: Initial release with `message`/`response` events

use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// Outbound chat event name
pub const MESSAGE_EVENT: &str = "message";

/// Inbound chat event name
pub const RESPONSE_EVENT: &str = "response";

/// Payload of an outbound `message` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub message: String,
    pub user_id: String,
}

/// Payload of an inbound `response` event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub message: Option<String>,
}

impl InboundMessage {
    pub fn new(message: impl Into<String>) -> Self {
        InboundMessage {
            message: Some(message.into()),
        }
    }

    /// Decode a raw event payload; anything without a string `message` reads as empty
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Emit `event` with `payload`. An error means the event was not delivered.
    async fn emit(&self, event: &str, payload: Value) -> Result<()>;

    /// Receive every future payload of `event`
    fn subscribe(&self, event: &str) -> mpsc::UnboundedReceiver<Value>;
}

/// One event delivered by the server in reply to an emit
#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Bridges events over HTTP: each emit is `POST {server}/events/{event}` and the
/// reply body carries the events the server emitted back.
///
/// Accepted reply bodies: empty, a list of `{ "event", "data" }` envelopes, a single
/// envelope, or a bare object which is delivered as a `response` event.
pub struct HttpTransport {
    client: reqwest::Client,
    server_url: String,
    subscribers: DashMap<String, Vec<mpsc::UnboundedSender<Value>>>,
}

impl HttpTransport {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(HttpTransport {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            subscribers: DashMap::new(),
        })
    }

    /// Deliver `payload` to local subscribers of `event`, dropping closed receivers
    pub fn publish(&self, event: &str, payload: Value) {
        let Some(mut senders) = self.subscribers.get_mut(event) else {
            debug!("No subscribers for '{event}', dropping payload");
            return;
        };
        senders.retain(|sender| sender.send(payload.clone()).is_ok());
    }

    fn dispatch_reply(&self, body: &str) -> Result<()> {
        if body.trim().is_empty() {
            return Ok(());
        }

        let value: Value = serde_json::from_str(body).context("Server reply is not JSON")?;
        match value {
            Value::Array(items) => {
                for item in items {
                    let envelope: Envelope =
                        serde_json::from_value(item).context("Malformed event envelope")?;
                    self.publish(&envelope.event, envelope.data);
                }
            }
            Value::Object(ref map) if map.contains_key("event") => {
                let envelope: Envelope = serde_json::from_value(value).context("Malformed event envelope")?;
                self.publish(&envelope.event, envelope.data);
            }
            other => self.publish(RESPONSE_EVENT, other),
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn emit(&self, event: &str, payload: Value) -> Result<()> {
        let url = format!("{}/events/{}", self.server_url, event);
        debug!("Emitting '{event}' to {url}");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach chat server at {}", self.server_url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat server error ({}): {}", status, body);
        }

        let body = response.text().await.context("Failed to read chat server reply")?;
        if let Err(e) = self.dispatch_reply(&body) {
            warn!("Ignoring undeliverable reply to '{event}': {e}");
        }
        Ok(())
    }

    fn subscribe(&self, event: &str) -> mpsc::UnboundedReceiver<Value> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .entry(event.to_string())
            .or_default()
            .push(sender);
        receiver
    }
}
