//! On-chain role discovery.
//!
//! Dispute contracts expose their parties as zero-argument address getters
//! (`landlord()`, `tenant()`, ...). Each getter is probed with `eth_call`;
//! getters the contract lacks simply fail and are skipped.

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::keccak256;

/// Getter names probed on every contract.
pub const ROLE_GETTERS: &[&str] = &[
    "landlord",
    "tenant",
    "plaintiff",
    "defendant",
    "claimant",
    "reporter",
    "debtor",
    "owner",
    "admin",
    "arbitrationService",
];

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleDiscovery: Send + Sync {
    /// Lowercased, de-duplicated party addresses for the contract.
    async fn discover(&self, contract_address: &str) -> Vec<String>;
}

/// 4-byte function selector for a zero-argument getter.
pub fn selector(getter: &str) -> String {
    let hash = keccak256(format!("{getter}()").as_bytes());
    format!("0x{}", hex::encode(&hash[..4]))
}

pub struct JsonRpcRoleDiscovery {
    http: reqwest::Client,
    rpc_url: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<Value>,
}

impl JsonRpcRoleDiscovery {
    pub fn new(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            timeout,
        }
    }

    async fn call_getter(&self, contract_address: &str, getter: &str) -> Result<Option<String>> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{ "to": contract_address, "data": selector(getter) }, "latest"],
        });

        let response = self.http.post(&self.rpc_url).json(&request).send().await?;
        if !response.status().is_success() {
            bail!("rpc status {}", response.status());
        }

        let body: RpcResponse = response.json().await?;
        if let Some(error) = body.error {
            bail!("rpc error: {error}");
        }
        let result = body.result.ok_or_else(|| anyhow!("rpc response without result"))?;
        Ok(decode_address_word(&result))
    }
}

/// Address from an ABI-encoded return word. `None` for empty or zero results.
fn decode_address_word(word: &str) -> Option<String> {
    let body = word.strip_prefix("0x").unwrap_or(word);
    if body.len() < 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    // Address is the low 20 bytes of the first word.
    let end = body.len().min(64);
    let address = format!("0x{}", body[end - 40..end].to_ascii_lowercase());
    (address != ZERO_ADDRESS).then_some(address)
}

#[async_trait]
impl RoleDiscovery for JsonRpcRoleDiscovery {
    async fn discover(&self, contract_address: &str) -> Vec<String> {
        if contract_address.is_empty() {
            return Vec::new();
        }

        let probes = ROLE_GETTERS.iter().map(|getter| async move {
            match tokio::time::timeout(self.timeout, self.call_getter(contract_address, getter)).await
            {
                Ok(Ok(address)) => address,
                Ok(Err(e)) => {
                    tracing::debug!(getter, error = %e, "role getter unavailable");
                    None
                }
                Err(_) => {
                    tracing::debug!(getter, "role getter timed out");
                    None
                }
            }
        });

        let mut addresses: Vec<String> = Vec::new();
        for address in join_all(probes).await.into_iter().flatten() {
            if !addresses.contains(&address) {
                addresses.push(address);
            }
        }

        tracing::debug!(contract = contract_address, found = addresses.len(), "role discovery finished");
        addresses
    }
}
