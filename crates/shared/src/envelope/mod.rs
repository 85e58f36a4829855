//! The evidence envelope: persisted JSON shape, producer and consumer.

mod observer;
mod open;
mod seal;
pub mod unwrap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ecies::EciesCiphertext;

pub use observer::{NoopObserver, SealObserver};
pub use open::{decrypt_envelope_with_private_key, open_with_chain};
pub use seal::{Recipient, SealRequest, seal, seal_plaintext};

pub const ENVELOPE_VERSION: &str = "1";
pub const ENCRYPTION_SCHEME: &str = "hybrid-aes256gcm-ecies-secp256k1";
pub const AES_ALGORITHM: &str = "AES-256-GCM";
pub const WRAP_FAILURE_CODE: &str = "ECIES_ENCRYPT_FAIL";

/// A stored evidence envelope.
///
/// Field names are part of the wire format. Everything except `version` is
/// optional on read so envelopes from older producers still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub evidence_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionInfo>,
    #[serde(default)]
    pub recipients: Vec<RecipientEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_digest: Option<String>,
    /// Direct encryption of the content for the only recipient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crypto: Option<WrappedKey>,
    /// Set only when encryption was explicitly disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<Value>,
}

impl Envelope {
    pub fn is_plaintext(&self) -> bool {
        self.plaintext.is_some() && self.ciphertext.is_none()
    }

    /// Addresses of every recipient entry, in envelope order.
    pub fn recipient_addresses(&self) -> Vec<String> {
        self.recipients.iter().map(|r| r.address.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionInfo {
    pub scheme: String,
    pub aes: AesParams,
}

/// Base64 IV and tag of the payload cipher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AesParams {
    pub iv: String,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algo: Option<String>,
}

fn default_ok() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientEntry {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub pubkey: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_key: Option<WrappedKey>,
    #[serde(
        rename = "encryptedKey_ecc",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub encrypted_key_ecc: Option<WrappedKey>,
    #[serde(default = "default_ok")]
    pub ok: bool,
}

/// Marker stored in place of a wrapped key when wrapping failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrapFailure {
    pub code: String,
    pub message: String,
    pub legacy: bool,
}

/// Contents of an `encryptedKey`-style field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WrappedKey {
    Ecies(EciesCiphertext),
    Failure(WrapFailure),
    /// The ECIES object serialized into a JSON string.
    Encoded(String),
}

impl WrappedKey {
    pub fn failure(message: impl Into<String>) -> Self {
        WrappedKey::Failure(WrapFailure {
            code: WRAP_FAILURE_CODE.to_string(),
            message: message.into(),
            legacy: true,
        })
    }

    /// The ECIES ciphertext, decoding the string form when needed.
    pub fn ciphertext(&self) -> Option<EciesCiphertext> {
        match self {
            WrappedKey::Ecies(ct) => Some(ct.clone()),
            WrappedKey::Encoded(raw) => serde_json::from_str(raw).ok(),
            WrappedKey::Failure(_) => None,
        }
    }
}
