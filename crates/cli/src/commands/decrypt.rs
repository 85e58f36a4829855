//! Decrypt evidence with a private key.
//!
//! Flow:
//! 1. Load the envelope (from the endpoint by digest, or from a local file)
//! 2. Find a recipient entry this key can unwrap
//! 3. Decrypt and print the content
//!
//! All failures after key parsing report the same message, so the output never
//! reveals which recipients an envelope has.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use shared::{Envelope, decrypt_envelope_with_private_key};

use crate::{api::Api, config::Config, ui};

pub enum Source {
    Digest(String),
    File(PathBuf),
}

pub async fn load_envelope(config: &Config, source: &Source) -> Result<Envelope> {
    match source {
        Source::Digest(digest) => {
            let api = Api::new(config.api_url.clone());
            let lookup = ui::spin("Fetching envelope...", api.get_evidence(digest)).await?;
            let envelope = lookup
                .envelope
                .ok_or_else(|| anyhow::anyhow!("{} is not a JSON envelope", lookup.file))?;
            Ok(serde_json::from_value(envelope)?)
        }
        Source::File(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(serde_json::from_slice(&bytes)?)
        }
    }
}

/// Decrypted content: JSON when it parses, otherwise a string.
pub async fn open(config: &Config, source: &Source, key_flag: Option<&str>) -> Result<Value> {
    let private_key = config.private_key(key_flag)?;
    let envelope = load_envelope(config, source).await?;
    Ok(decrypt_envelope_with_private_key(&envelope, private_key)?)
}

pub async fn run(config: &Config, source: Source, key_flag: Option<&str>) -> Result<()> {
    match open(config, &source, key_flag).await? {
        Value::String(text) => println!("{text}"),
        other => println!("{}", serde_json::to_string_pretty(&other)?),
    }
    Ok(())
}
