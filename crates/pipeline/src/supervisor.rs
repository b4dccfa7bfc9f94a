//! Restart-with-backoff for the pipeline's long-running loops.
//!
//! A loop that fails (in practice: it cannot subscribe because the bus is
//! gone) is restarted after an exponentially growing delay until it
//! finishes cleanly or the [`CancellationToken`] fires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use coldchain_events::{
    run_consumer, BusError, EventBus, MessageHandler, PollConfig, Subscription,
};
use coldchain_simulator::{Scenario, SimulationRunner};

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first restart.
    pub initial_delay: Duration,
    /// Upper bound on the delay between restarts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Calculate the next backoff delay, clamped to `max_delay`.
pub fn next_delay(current: Duration, config: &BackoffConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

/// A restartable unit of work.
#[async_trait]
pub trait Supervised: Send {
    /// Run until done or cancelled. An error asks for a restart.
    async fn run_once(&mut self, cancel: CancellationToken) -> Result<(), BusError>;
}

/// Keep `task` running until it returns `Ok` or `cancel` fires.
///
/// Returns the number of failed attempts.
pub async fn supervise<T>(
    name: &str,
    task: &mut T,
    backoff: &BackoffConfig,
    cancel: CancellationToken,
) -> u32
where
    T: Supervised + ?Sized,
{
    let mut delay = backoff.initial_delay;
    let mut failures = 0u32;

    loop {
        if cancel.is_cancelled() {
            return failures;
        }

        match task.run_once(cancel.clone()).await {
            Ok(()) => {
                tracing::info!(task = name, "Task finished");
                return failures;
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(
                    task = name,
                    attempt = failures,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Task failed, restarting after backoff"
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return failures,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = next_delay(delay, backoff);
    }
}

// ---------------------------------------------------------------------------
// Task adapters
// ---------------------------------------------------------------------------

/// A bus consumer driving `handler`.
///
/// [`ConsumerTask::new`] subscribes right away, so messages published after
/// construction reach the first attempt even if the task has not been polled
/// yet. Restarts subscribe afresh.
pub struct ConsumerTask<H> {
    name: &'static str,
    bus: Arc<EventBus>,
    topics: Vec<&'static str>,
    handler: H,
    poll: PollConfig,
    subscription: Option<Subscription>,
}

impl<H: MessageHandler> ConsumerTask<H> {
    pub fn new(
        name: &'static str,
        bus: Arc<EventBus>,
        topics: &[&'static str],
        handler: H,
        poll: PollConfig,
    ) -> Self {
        let subscription = match bus.subscribe(topics) {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!(task = name, error = %e, "Early subscription failed, retrying on start");
                None
            }
        };
        Self {
            name,
            bus,
            topics: topics.to_vec(),
            handler,
            poll,
            subscription,
        }
    }
}

#[async_trait]
impl<H: MessageHandler> Supervised for ConsumerTask<H> {
    async fn run_once(&mut self, cancel: CancellationToken) -> Result<(), BusError> {
        let subscription = match self.subscription.take() {
            Some(subscription) => subscription,
            None => self.bus.subscribe(&self.topics)?,
        };
        run_consumer(self.name, subscription, &mut self.handler, self.poll, cancel).await
    }
}

#[async_trait]
impl<S: Scenario> Supervised for SimulationRunner<S> {
    async fn run_once(&mut self, cancel: CancellationToken) -> Result<(), BusError> {
        let summary = self.run(cancel).await?;
        tracing::info!(
            steps = summary.steps,
            status = %summary.final_status,
            "Simulation run complete"
        );
        Ok(())
    }
}
