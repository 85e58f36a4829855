use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_storage_dir() -> String {
    "evidence_storage".to_string()
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_rpc_timeout_ms() -> u64 {
    5_000
}

fn default_body_limit() -> usize {
    20 * 1024 * 1024
}

/// Server configuration, read from `EVIDENCE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for local envelope copies and the index log.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    /// JSON-RPC node used for role discovery.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Upper bound for each role probe.
    #[serde(default = "default_rpc_timeout_ms")]
    pub rpc_timeout_ms: u64,
    /// IPFS HTTP API (e.g. http://127.0.0.1:5001). Remote tier is skipped when unset.
    #[serde(default)]
    pub ipfs_api_url: Option<String>,
    /// Admin public key, any secp256k1 encoding.
    #[serde(default)]
    pub admin_public_key: Option<String>,
    /// File containing the admin public key. Used when `admin_public_key` is unset.
    #[serde(default)]
    pub admin_public_key_file: Option<String>,
    /// Admin address. Derived from the public key when unset.
    #[serde(default)]
    pub admin_address: Option<String>,
    /// Store evidence unencrypted when no admin key is configured.
    #[serde(default)]
    pub allow_plaintext_storage: bool,
    /// Inline address → public key map (JSON object).
    #[serde(default)]
    pub recipient_pubkeys_json: Option<String>,
    /// Path to an address → public key map (JSON object).
    #[serde(default)]
    pub recipient_pubkeys_file: Option<String>,
    /// Also write eth-crypto formatted key wraps (`encryptedKey_ecc`).
    #[serde(default)]
    pub alternate_wrapping: bool,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Set to "production" for JSON logging, anything else for human-readable.
    #[serde(default)]
    pub env: String,
    /// Sentry DSN for error tracking
    #[serde(default)]
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }

    pub fn rpc_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.rpc_timeout_ms)
    }
}
