//! JSON-RPC settlement backend.
//!
//! Each breach becomes an `eth_sendTransaction` to the configured contract
//! whose `data` field carries the hex-encoded JSON breach record. The call
//! then polls `eth_getTransactionReceipt` until the transaction is mined or
//! the confirmation timeout elapses.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::Instant;

use coldchain_core::geo::Location;

use crate::backend::BreachLedger;
use crate::error::LedgerError;

/// Default settlement node endpoint (local development chain).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:7545";

/// HTTP timeout for a single RPC call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for [`RpcLedger`].
#[derive(Debug, Clone, PartialEq)]
pub struct RpcLedgerConfig {
    pub rpc_url: String,
    /// Address of the deployed breach-registry contract.
    pub contract_address: String,
    /// Sending account; the node's default account is used when `None`.
    pub from_account: Option<String>,
    pub confirmation_timeout: Duration,
    /// Pause between two receipt lookups.
    pub poll_interval: Duration,
}

impl RpcLedgerConfig {
    pub fn new(rpc_url: impl Into<String>, contract_address: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            contract_address: contract_address.into(),
            from_account: None,
            confirmation_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Receipt {
    /// `"0x1"` on success, `"0x0"` when reverted.
    status: Option<String>,
}

/// Ledger backed by a JSON-RPC settlement node.
pub struct RpcLedger {
    client: reqwest::Client,
    config: RpcLedgerConfig,
    next_id: AtomicU64,
}

impl RpcLedger {
    pub fn new(config: RpcLedgerConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        tracing::info!(
            rpc_url = %config.rpc_url,
            contract = %config.contract_address,
            "Breach ledger initialized in RPC mode"
        );
        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &RpcLedgerConfig {
        &self.config
    }

    async fn send_transaction(&self, data: String) -> Result<String, LedgerError> {
        let params = send_params(&self.config, data);
        let tx_hash: Option<String> = self.call("eth_sendTransaction", params).await?;
        tx_hash.ok_or_else(|| LedgerError::Rpc {
            code: 0,
            message: "eth_sendTransaction returned no transaction hash".to_string(),
        })
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<(), LedgerError> {
        let started = Instant::now();

        loop {
            let receipt: Option<Receipt> = self
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;

            if let Some(receipt) = receipt {
                if receipt.status.as_deref() == Some("0x0") {
                    return Err(LedgerError::Reverted(tx_hash.to_string()));
                }
                return Ok(());
            }

            if started.elapsed().saturating_add(self.config.poll_interval)
                > self.config.confirmation_timeout
            {
                return Err(LedgerError::ConfirmationTimeout {
                    tx_hash: tx_hash.to_string(),
                    timeout_secs: self.config.confirmation_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::HttpStatus(status.as_u16()));
        }

        let body: RpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(body.result)
    }
}

#[async_trait]
impl BreachLedger for RpcLedger {
    async fn record_temperature_breach(
        &self,
        pallet_id: &str,
        temperature: f64,
        location: &Location,
    ) -> Result<String, LedgerError> {
        let data = encode_breach(pallet_id, temperature, location)?;
        let tx_hash = self.send_transaction(data).await?;
        tracing::debug!(pallet_id, tx_hash = %tx_hash, "Breach transaction submitted");

        self.wait_for_receipt(&tx_hash).await?;
        tracing::info!(pallet_id, temperature, tx_hash = %tx_hash, "Recorded temperature breach on chain");
        Ok(tx_hash)
    }

    fn backend_name(&self) -> &'static str {
        "rpc"
    }
}

/// Hex-encode the JSON breach record as transaction data.
fn encode_breach(pallet_id: &str, temperature: f64, location: &Location) -> Result<String, LedgerError> {
    let payload = serde_json::to_vec(&json!({
        "type": "temperature_breach",
        "pallet_id": pallet_id,
        "temperature": temperature,
        "location": location,
        "timestamp": Utc::now(),
    }))?;
    Ok(to_hex(&payload))
}

fn send_params(config: &RpcLedgerConfig, data: String) -> serde_json::Value {
    let mut tx = json!({
        "to": config.contract_address,
        "data": data,
    });
    if let Some(from) = &config.from_account {
        tx["from"] = json!(from);
    }
    json!([tx])
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("0x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}
