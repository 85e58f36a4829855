//! Recipient key material known to the server.
//!
//! The registry maps party addresses to public keys so that addresses found
//! by role discovery can be encrypted to. It is built once at startup and
//! shared through `AppState`.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use shared::keys::{address_from_public_key_hex, canonicalize_address, normalize_public_key};

use crate::config::Config;

#[derive(Debug, Clone, Default)]
pub struct RecipientRegistry {
    keys: HashMap<String, String>,
}

impl RecipientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of `address → public key`.
    ///
    /// Entries with a malformed address or key are skipped with a warning so a
    /// single bad row does not take the server down.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: HashMap<String, String> =
            serde_json::from_str(json).context("recipient key map must be a JSON object of strings")?;

        let mut registry = Self::new();
        for (address, public_key) in raw {
            if let Err(e) = registry.insert(&address, &public_key) {
                tracing::warn!(%address, error = %e, "skipping recipient key");
            }
        }
        Ok(registry)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading recipient keys from {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Inline JSON takes precedence over the file. Empty when neither is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        if let Some(json) = config.recipient_pubkeys_json.as_deref().filter(|s| !s.trim().is_empty()) {
            return Self::from_json(json);
        }
        if let Some(path) = config.recipient_pubkeys_file.as_deref().filter(|s| !s.is_empty()) {
            return Self::from_file(path);
        }
        Ok(Self::new())
    }

    pub fn insert(&mut self, address: &str, public_key: &str) -> Result<()> {
        let Some(address) = canonicalize_address(address) else {
            bail!("invalid address");
        };
        let public_key = normalize_public_key(public_key)?;
        self.keys.insert(address, public_key);
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&str> {
        let address = canonicalize_address(address)?;
        self.keys.get(&address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Key of the party that can always open stored evidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminKey {
    pub address: String,
    pub public_key: String,
}

impl AdminKey {
    pub fn new(public_key: &str, address: Option<&str>) -> Result<Self> {
        let public_key = normalize_public_key(public_key).context("invalid admin public key")?;
        let address = match address.filter(|a| !a.is_empty()) {
            Some(given) => canonicalize_address(given).context("invalid admin address")?,
            None => address_from_public_key_hex(&public_key)?,
        };
        Ok(Self { address, public_key })
    }

    /// `None` when no admin key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let inline = config
            .admin_public_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let public_key = match inline {
            Some(key) => key,
            None => match config.admin_public_key_file.as_deref().filter(|p| !p.is_empty()) {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading admin public key from {path}"))?
                    .trim()
                    .to_string(),
                None => return Ok(None),
            },
        };

        Self::new(&public_key, config.admin_address.as_deref()).map(Some)
    }
}
