//! Multi-topic subscriptions with a timeout-bounded receive.

use std::time::Duration;

use futures::future::select_all;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tokio::time::Instant;

use crate::bus::BusMessage;
use crate::error::BusError;

/// Longest single wait; larger poll timeouts are clamped to it.
pub const MAX_POLL_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A consumer's view of one or more bus topics.
///
/// Messages from a single topic arrive in publish order; there is no
/// ordering guarantee across topics. Topics are visited round-robin so a
/// busy topic cannot starve a quiet one.
#[derive(Debug)]
pub struct Subscription {
    receivers: Vec<(String, Receiver<BusMessage>)>,
    /// Index of the receiver checked first on the next receive.
    cursor: usize,
}

impl Subscription {
    pub(crate) fn new(receivers: Vec<(String, Receiver<BusMessage>)>) -> Self {
        Self {
            receivers,
            cursor: 0,
        }
    }

    /// Names of the topics this subscription still listens on.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.receivers.iter().map(|(topic, _)| topic.as_str())
    }

    /// Return the next already-buffered message without waiting.
    ///
    /// `Ok(None)` means nothing is pending right now. Returns
    /// [`BusError::Closed`] once every topic has been closed and drained.
    pub fn try_next(&mut self) -> Result<Option<BusMessage>, BusError> {
        let count = self.receivers.len();
        let mut closed = Vec::new();

        for offset in 0..count {
            let idx = (self.cursor + offset) % count;
            let (topic, rx) = &mut self.receivers[idx];

            loop {
                match rx.try_recv() {
                    Ok(message) => {
                        self.cursor = (idx + 1) % count;
                        return Ok(Some(message));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %topic, skipped, "Subscriber lagged, messages skipped");
                    }
                    Err(TryRecvError::Closed) => {
                        closed.push(idx);
                        break;
                    }
                }
            }
        }

        self.drop_closed(closed);
        if self.receivers.is_empty() {
            return Err(BusError::Closed);
        }
        Ok(None)
    }

    /// Wait up to `timeout` for the next message on any subscribed topic.
    ///
    /// Returns `Ok(None)` when the timeout elapses with nothing received.
    /// `timeout` is clamped to [`MAX_POLL_TIMEOUT`].
    /// This is the only suspension point of a consumer loop, and it is
    /// cancel-safe: dropping the future loses no message.
    pub async fn poll(&mut self, timeout: Duration) -> Result<Option<BusMessage>, BusError> {
        if let Some(message) = self.try_next()? {
            return Ok(Some(message));
        }

        let deadline = Instant::now() + timeout.min(MAX_POLL_TIMEOUT);

        loop {
            let waiters = self
                .receivers
                .iter_mut()
                .map(|(_, rx)| Box::pin(rx.recv()));

            let (result, idx) = match tokio::time::timeout_at(deadline, select_all(waiters)).await
            {
                Err(_elapsed) => return Ok(None),
                Ok((result, idx, rest)) => {
                    drop(rest);
                    (result, idx)
                }
            };

            match result {
                Ok(message) => {
                    self.cursor = (idx + 1) % self.receivers.len();
                    return Ok(Some(message));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        topic = %self.receivers[idx].0,
                        skipped,
                        "Subscriber lagged, messages skipped"
                    );
                }
                Err(RecvError::Closed) => {
                    self.drop_closed(vec![idx]);
                    if self.receivers.is_empty() {
                        return Err(BusError::Closed);
                    }
                }
            }
        }
    }

    /// Close the subscription, releasing every topic receiver.
    pub fn close(self) {
        let topics: Vec<_> = self.topics().map(str::to_string).collect();
        tracing::debug!(?topics, "Subscription closed");
    }

    fn drop_closed(&mut self, mut closed: Vec<usize>) {
        if closed.is_empty() {
            return;
        }
        closed.sort_unstable();
        for idx in closed.into_iter().rev() {
            let (topic, _) = self.receivers.remove(idx);
            tracing::debug!(topic = %topic, "Topic closed, dropping receiver");
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;

    const SHORT: Duration = Duration::from_millis(20);

    #[tokio::test]
    async fn poll_times_out_with_none() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe(&["alerts"]).unwrap();

        let started = std::time::Instant::now();
        let polled = sub.poll(SHORT).await.unwrap();

        assert!(polled.is_none());
        assert!(started.elapsed() >= SHORT);
    }

    #[tokio::test]
    async fn poll_wakes_on_late_publish() {
        let bus = std::sync::Arc::new(EventBus::default());
        let mut sub = bus.subscribe(&["alerts", "logistics_commands"]).unwrap();

        let publisher = std::sync::Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            publisher.publish("logistics_commands", "late");
        });

        let msg = sub.poll(Duration::from_secs(2)).await.unwrap().unwrap();
        assert_eq!(msg.topic, "logistics_commands");
        assert_eq!(msg.payload, "late");
    }

    #[tokio::test]
    async fn multi_topic_subscription_receives_both_topics() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe(&["alerts", "logistics_commands"]).unwrap();

        bus.publish("alerts", "a1");
        bus.publish("logistics_commands", "c1");
        bus.publish("alerts", "a2");

        let mut alerts = Vec::new();
        let mut commands = Vec::new();
        while let Some(msg) = sub.poll(SHORT).await.unwrap() {
            match msg.topic.as_str() {
                "alerts" => alerts.push(msg.payload),
                _ => commands.push(msg.payload),
            }
        }

        assert_eq!(alerts, vec!["a1", "a2"]);
        assert_eq!(commands, vec!["c1"]);
    }

    #[tokio::test]
    async fn huge_timeout_is_clamped_and_still_wakes() {
        let bus = std::sync::Arc::new(EventBus::default());
        let mut sub = bus.subscribe(&["alerts"]).unwrap();

        let publisher = std::sync::Arc::clone(&bus);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            publisher.publish("alerts", "late");
        });

        let msg = sub.poll(Duration::MAX).await.unwrap().unwrap();
        assert_eq!(msg.payload, "late");
    }

    #[test]
    fn try_next_is_non_blocking() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe(&["commands"]).unwrap();

        assert!(sub.try_next().unwrap().is_none());
        bus.publish("commands", "x");
        assert_eq!(sub.try_next().unwrap().unwrap().payload, "x");
        assert!(sub.try_next().unwrap().is_none());
    }

    #[test]
    fn lagging_subscriber_skips_oldest_messages() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe(&["sensor_data"]).unwrap();

        for i in 0..5 {
            bus.publish("sensor_data", i.to_string());
        }

        assert_eq!(sub.try_next().unwrap().unwrap().payload, "3");
        assert_eq!(sub.try_next().unwrap().unwrap().payload, "4");
        assert!(sub.try_next().unwrap().is_none());
    }

    #[test]
    fn close_releases_receivers() {
        let bus = EventBus::default();
        let sub = bus.subscribe(&["alerts"]).unwrap();
        assert_eq!(bus.subscriber_count("alerts"), 1);

        sub.close();
        assert_eq!(bus.subscriber_count("alerts"), 0);
    }
}
