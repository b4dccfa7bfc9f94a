//! In-process event bus backed by one `tokio::sync::broadcast` channel per
//! topic.
//!
//! [`EventBus`] is the central publish/subscribe hub of the pipeline. It is
//! designed to be shared via `Arc<EventBus>` across every component task.
//! Payloads are opaque serialized JSON strings: the bus never inspects or
//! validates them, decoding is the consumer's job.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use coldchain_core::types::Timestamp;

use crate::error::BusError;
use crate::subscription::Subscription;

// ---------------------------------------------------------------------------
// BusMessage
// ---------------------------------------------------------------------------

/// A message as delivered to subscribers.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Topic the message was published on.
    pub topic: String,

    /// Serialized JSON record, passed through untouched.
    pub payload: String,

    /// When the bus accepted the message (UTC).
    pub published_at: Timestamp,
}

impl BusMessage {
    /// Decode the payload into a typed message.
    ///
    /// Returns [`BusError::Malformed`] when the payload is not valid JSON or
    /// does not match `T` (including unknown `type` discriminants).
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BusError> {
        serde_json::from_str(&self.payload).map_err(|source| BusError::Malformed {
            topic: self.topic.clone(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for each topic's broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process, topic-keyed fan-out bus.
///
/// Every subscriber of a topic independently receives each message published
/// on it after it subscribed. Delivery is best-effort and at-most-once: a
/// subscriber that falls more than `capacity` messages behind skips the
/// oldest ones.
///
/// # Usage
///
/// ```rust
/// use coldchain_events::EventBus;
///
/// let bus = EventBus::default();
/// let _sub = bus.subscribe(&["sensor_data"]).unwrap();
///
/// bus.publish("sensor_data", r#"{"pallet_id":"PALLET_001"}"#);
/// ```
pub struct EventBus {
    topics: RwLock<HashMap<String, broadcast::Sender<BusMessage>>>,
    closed: AtomicBool,
    capacity: usize,
}

impl EventBus {
    /// Create a bus whose topic channels buffer `capacity` messages.
    ///
    /// When a topic buffer is full, the oldest un-consumed messages are
    /// dropped and slow subscribers observe a lag.
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            capacity: capacity.max(1),
        }
    }

    /// Publish a raw payload on `topic`.
    ///
    /// Never blocks. If the topic has no subscribers, or the bus is closed,
    /// the message is silently dropped.
    pub fn publish(&self, topic: &str, payload: impl Into<String>) {
        if self.is_closed() {
            tracing::debug!(topic, "Dropping message published on a closed bus");
            return;
        }

        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(sender) = topics.get(topic) {
            let message = BusMessage {
                topic: topic.to_string(),
                payload: payload.into(),
                published_at: Utc::now(),
            };
            // Ignore the SendError -- it only means there are zero receivers.
            let _ = sender.send(message);
        }
    }

    /// Serialize `message` to JSON and publish it on `topic`.
    pub fn publish_json<T: Serialize>(&self, topic: &str, message: &T) -> Result<(), BusError> {
        let payload = serde_json::to_string(message).map_err(|source| BusError::Serialization {
            topic: topic.to_string(),
            source,
        })?;
        self.publish(topic, payload);
        Ok(())
    }

    /// Subscribe to one or more topics.
    ///
    /// Duplicate topic names are collapsed. Fails with
    /// [`BusError::NoTopics`] for an empty list and [`BusError::Closed`]
    /// once the bus has been shut down.
    pub fn subscribe(&self, topics: &[&str]) -> Result<Subscription, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if topics.is_empty() {
            return Err(BusError::NoTopics);
        }

        let mut registry = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        let mut receivers = Vec::with_capacity(topics.len());

        for &topic in topics {
            if receivers.iter().any(|(name, _)| name == topic) {
                continue;
            }
            let sender = registry
                .entry(topic.to_string())
                .or_insert_with(|| broadcast::channel(self.capacity).0);
            receivers.push((topic.to_string(), sender.subscribe()));
        }

        Ok(Subscription::new(receivers))
    }

    /// Shut the bus down.
    ///
    /// Drops every topic sender: open subscriptions drain whatever is still
    /// buffered and then observe [`BusError::Closed`]; new subscriptions
    /// are refused.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.topics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("Event bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
