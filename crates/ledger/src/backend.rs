use async_trait::async_trait;

use coldchain_core::geo::Location;

use crate::error::LedgerError;
use crate::record::LedgerRecord;

/// A place where temperature breaches are recorded.
///
/// Implementations must be safe to share between tasks; concurrent calls
/// are serialized internally where ordering matters.
#[async_trait]
pub trait BreachLedger: Send + Sync {
    /// Record one breach and return its transaction id.
    async fn record_temperature_breach(
        &self,
        pallet_id: &str,
        temperature: f64,
        location: &Location,
    ) -> Result<String, LedgerError>;

    /// Records kept locally, oldest first. Backends that keep no local
    /// chain return an empty list.
    async fn chain(&self) -> Vec<LedgerRecord> {
        Vec::new()
    }

    /// Short backend name for logs and the status API.
    fn backend_name(&self) -> &'static str;
}
