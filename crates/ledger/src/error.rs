/// Reasons a breach could not be recorded.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The hash source produced something other than 16 hex characters.
    /// Nothing was appended.
    #[error("Hash source produced an invalid block hash: {0:?}")]
    InvalidHash(String),

    /// The settlement node answered with a JSON-RPC error object.
    #[error("Ledger RPC error ({code}): {message}")]
    Rpc { code: i64, message: String },

    /// The HTTP request itself failed (connect, DNS, timeout, body).
    #[error("Ledger HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The settlement node returned a non-2xx status code.
    #[error("Ledger RPC returned HTTP {0}")]
    HttpStatus(u16),

    /// No receipt appeared before the confirmation timeout.
    #[error("Transaction {tx_hash} not confirmed within {timeout_secs}s")]
    ConfirmationTimeout { tx_hash: String, timeout_secs: u64 },

    /// The transaction was mined but reverted.
    #[error("Transaction {0} was reverted")]
    Reverted(String),

    #[error("Failed to encode ledger payload: {0}")]
    Serialization(#[from] serde_json::Error),
}
