//! Ledger decorator that announces successful records on the bus.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use coldchain_core::feedback::LedgerFeedback;
use coldchain_core::geo::Location;
use coldchain_core::topics::TOPIC_LEDGER_FEEDBACK;
use coldchain_events::EventBus;

use crate::backend::BreachLedger;
use crate::error::LedgerError;
use crate::record::LedgerRecord;

/// Wraps a backend and publishes [`LedgerFeedback::BreachRecorded`] on
/// `ledger_feedback` after every successful record.
///
/// Publishing problems are logged and never change the outcome returned to
/// the caller.
pub struct NotifyingLedger<L> {
    inner: L,
    bus: Arc<EventBus>,
}

impl<L: BreachLedger> NotifyingLedger<L> {
    pub fn new(inner: L, bus: Arc<EventBus>) -> Self {
        Self { inner, bus }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: BreachLedger> BreachLedger for NotifyingLedger<L> {
    async fn record_temperature_breach(
        &self,
        pallet_id: &str,
        temperature: f64,
        location: &Location,
    ) -> Result<String, LedgerError> {
        let tx_hash = self
            .inner
            .record_temperature_breach(pallet_id, temperature, location)
            .await?;

        let feedback = LedgerFeedback::BreachRecorded {
            pallet_id: pallet_id.to_string(),
            tx_hash: tx_hash.clone(),
            timestamp: Utc::now(),
        };
        if let Err(e) = self.bus.publish_json(TOPIC_LEDGER_FEEDBACK, &feedback) {
            tracing::warn!(pallet_id, error = %e, "Failed to publish ledger feedback");
        }

        Ok(tx_hash)
    }

    async fn chain(&self) -> Vec<LedgerRecord> {
        self.inner.chain().await
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}
