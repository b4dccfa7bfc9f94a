//! Cancellable polling loop shared by every bus consumer.
//!
//! A consumer blocks on [`Subscription::poll`] for a bounded time, processes
//! at most one message, pauses briefly, and repeats until its
//! [`CancellationToken`] fires. Message processing is never interrupted
//! halfway: cancellation is only observed while polling or pausing.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::bus::BusMessage;
use crate::error::BusError;
use crate::subscription::Subscription;

/// Default upper bound for a single poll.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default pause between two polls.
pub const DEFAULT_IDLE_PAUSE: Duration = Duration::from_millis(100);

/// Pacing of a consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub poll_timeout: Duration,
    pub idle_pause: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            idle_pause: DEFAULT_IDLE_PAUSE,
        }
    }
}

/// Something that reacts to bus messages.
///
/// Handlers own their state exclusively; errors are handled (logged) inside
/// `handle` so one bad message never stops the loop.
#[async_trait]
pub trait MessageHandler: Send {
    async fn handle(&mut self, message: BusMessage);
}

/// Drive `handler` from `subscription` until `cancel` fires.
///
/// Returns `Ok(())` on cancellation, after closing the subscription. Returns
/// [`BusError::Closed`] if the bus goes away underneath the loop, so a
/// supervisor can decide whether to restart it.
pub async fn run_consumer<H>(
    name: &str,
    mut subscription: Subscription,
    handler: &mut H,
    config: PollConfig,
    cancel: CancellationToken,
) -> Result<(), BusError>
where
    H: MessageHandler + ?Sized,
{
    let topics: Vec<_> = subscription.topics().map(str::to_string).collect();
    tracing::info!(consumer = name, ?topics, "Consumer started");

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = subscription.poll(config.poll_timeout) => polled,
        };

        match polled {
            Ok(Some(message)) => {
                tracing::debug!(consumer = name, topic = %message.topic, "Received message");
                handler.handle(message).await;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(consumer = name, error = %e, "Consumer lost its subscription");
                return Err(e);
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.idle_pause) => {}
        }
    }

    subscription.close();
    tracing::info!(consumer = name, "Consumer stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;
    use crate::bus::EventBus;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&mut self, message: BusMessage) {
            self.seen.push(message.payload);
        }
    }

    fn fast() -> PollConfig {
        PollConfig {
            poll_timeout: Duration::from_millis(10),
            idle_pause: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn cancelled_loop_returns_ok_and_unsubscribes() {
        let bus = EventBus::default();
        let sub = bus.subscribe(&["alerts"]).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut recorder = Recorder::default();
        let result = run_consumer("test", sub, &mut recorder, fast(), cancel).await;

        assert!(result.is_ok());
        assert_eq!(bus.subscriber_count("alerts"), 0);
    }

    #[tokio::test]
    async fn processes_messages_until_cancelled() {
        let bus = Arc::new(EventBus::default());
        let sub = bus.subscribe(&["alerts"]).unwrap();
        let cancel = CancellationToken::new();

        bus.publish("alerts", "one");
        bus.publish("alerts", "two");

        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut recorder = Recorder::default();
            run_consumer("test", sub, &mut recorder, fast(), loop_cancel)
                .await
                .map(|()| recorder.seen)
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let seen = handle.await.unwrap().unwrap();
        assert_eq!(seen, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn closed_bus_ends_loop_with_error() {
        let bus = EventBus::default();
        let sub = bus.subscribe(&["alerts"]).unwrap();
        bus.close();

        let mut recorder = Recorder::default();
        let result = run_consumer("test", sub, &mut recorder, fast(), CancellationToken::new()).await;

        assert_matches!(result, Err(BusError::Closed));
    }
}
