//! Envelope producer core.
//!
//! Encrypts the canonical payload once and wraps the symmetric key for every
//! recipient. A recipient whose key cannot be wrapped still gets an entry,
//! marked `ok: false`; the envelope is only rejected when the payload itself
//! cannot be encrypted.

use std::collections::HashSet;

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

use super::{
    AES_ALGORITHM, AesParams, ENCRYPTION_SCHEME, ENVELOPE_VERSION, EncryptionInfo, Envelope,
    RecipientEntry, SealObserver, WrappedKey,
};
use crate::canonical::{Payload, keccak256_hex};
use crate::cipher::{self, SymmetricKey};
use crate::ecies;
use crate::error::EnvelopeError;
use crate::keys::{address_from_public_key, canonicalize_address, parse_public_key, public_key_to_hex};

/// A recipient as resolved by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    /// Known address. Derived from the public key when absent.
    pub address: Option<String>,
    /// Public key in any supported encoding.
    pub public_key: String,
}

impl Recipient {
    pub fn from_public_key(public_key: impl Into<String>) -> Self {
        Self {
            address: None,
            public_key: public_key.into(),
        }
    }

    pub fn with_address(address: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            public_key: public_key.into(),
        }
    }
}

/// Everything needed to produce one envelope.
#[derive(Debug, Clone)]
pub struct SealRequest {
    pub payload: Payload,
    pub recipients: Vec<Recipient>,
    /// Storage digest. Defaults to keccak256 of the base64 ciphertext.
    pub digest: Option<String>,
    pub tx_hash: Option<String>,
    pub contract_address: Option<String>,
    pub evidence_type: Option<String>,
    /// Also wrap each key in the eth-crypto format under `encryptedKey_ecc`.
    pub alternate_wrapping: bool,
}

impl SealRequest {
    pub fn new(payload: impl Into<Payload>, recipients: Vec<Recipient>) -> Self {
        Self {
            payload: payload.into(),
            recipients,
            digest: None,
            tx_hash: None,
            contract_address: None,
            evidence_type: None,
            alternate_wrapping: false,
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Builds an encrypted envelope.
pub fn seal(request: &SealRequest, observer: &dyn SealObserver) -> Result<Envelope, EnvelopeError> {
    let canonical = request.payload.canonical();
    let content_digest = keccak256_hex(canonical.as_bytes());

    let key = SymmetricKey::generate();
    let sealed = cipher::encrypt(&key, canonical.as_bytes())?;
    let ciphertext = BASE64.encode(&sealed.ciphertext);

    let mut seen = HashSet::new();
    let mut recipients = Vec::with_capacity(request.recipients.len());
    for recipient in &request.recipients {
        let entry = wrap_for(recipient, &key, request.alternate_wrapping);
        let dedupe_key = if entry.address.is_empty() {
            entry.pubkey.clone()
        } else {
            entry.address.clone()
        };
        if !seen.insert(dedupe_key) {
            observer.recipient_skipped(&entry.address);
            continue;
        }

        match &entry.encrypted_key {
            Some(WrappedKey::Failure(failure)) => {
                observer.recipient_failed(&entry.address, &failure.message)
            }
            _ => observer.recipient_wrapped(&entry.address),
        }
        recipients.push(entry);
    }

    let crypto = legacy_crypto(&recipients, &canonical);
    let digest = request
        .digest
        .clone()
        .unwrap_or_else(|| keccak256_hex(ciphertext.as_bytes()));

    let envelope = Envelope {
        version: ENVELOPE_VERSION.to_string(),
        digest: Some(digest),
        tx_hash: request.tx_hash.clone(),
        contract_address: request.contract_address.clone(),
        evidence_type: request.evidence_type.clone(),
        timestamp: Some(now_rfc3339()),
        encryption: Some(EncryptionInfo {
            scheme: ENCRYPTION_SCHEME.to_string(),
            aes: AesParams {
                iv: BASE64.encode(sealed.iv),
                tag: BASE64.encode(sealed.tag),
                algo: Some(AES_ALGORITHM.to_string()),
            },
        }),
        recipients,
        ciphertext: Some(ciphertext),
        content_digest: Some(content_digest),
        crypto,
        plaintext: None,
    };

    observer.envelope_sealed(&envelope);
    Ok(envelope)
}

/// Builds an unencrypted envelope. Only for deployments that explicitly allow it.
pub fn seal_plaintext(request: &SealRequest, observer: &dyn SealObserver) -> Envelope {
    let canonical = request.payload.canonical();
    let plaintext = match &request.payload {
        Payload::Json(value) => value.clone(),
        Payload::Text(text) => Value::String(text.clone()),
    };
    let digest = request
        .digest
        .clone()
        .unwrap_or_else(|| keccak256_hex(canonical.as_bytes()));

    let envelope = Envelope {
        version: ENVELOPE_VERSION.to_string(),
        digest: Some(digest),
        tx_hash: request.tx_hash.clone(),
        contract_address: request.contract_address.clone(),
        evidence_type: request.evidence_type.clone(),
        timestamp: Some(now_rfc3339()),
        encryption: None,
        recipients: Vec::new(),
        ciphertext: None,
        content_digest: Some(keccak256_hex(canonical.as_bytes())),
        crypto: None,
        plaintext: Some(plaintext),
    };

    observer.envelope_sealed(&envelope);
    envelope
}

fn wrap_for(recipient: &Recipient, key: &SymmetricKey, alternate: bool) -> RecipientEntry {
    let given_address = recipient
        .address
        .as_deref()
        .and_then(canonicalize_address);

    let public_key = match parse_public_key(&recipient.public_key) {
        Ok(pk) => pk,
        Err(e) => {
            return RecipientEntry {
                address: given_address.unwrap_or_default(),
                pubkey: recipient.public_key.trim().to_ascii_lowercase(),
                encrypted_key: Some(WrappedKey::failure(e.to_string())),
                encrypted_key_ecc: None,
                ok: false,
            };
        }
    };

    let address = given_address.unwrap_or_else(|| address_from_public_key(&public_key));
    let pubkey = public_key_to_hex(&public_key);
    let key_hex = key.to_hex();

    match ecies::encrypt_gcm(&public_key, key_hex.as_bytes()) {
        Ok(wrapped) => {
            let encrypted_key_ecc = alternate
                .then(|| ecies::encrypt_eth(&public_key, key_hex.as_bytes()).ok())
                .flatten()
                .map(WrappedKey::Ecies);

            RecipientEntry {
                address,
                pubkey,
                encrypted_key: Some(WrappedKey::Ecies(wrapped)),
                encrypted_key_ecc,
                ok: true,
            }
        }
        Err(e) => RecipientEntry {
            address,
            pubkey,
            encrypted_key: Some(WrappedKey::failure(e.to_string())),
            encrypted_key_ecc: None,
            ok: false,
        },
    }
}

fn legacy_crypto(recipients: &[RecipientEntry], canonical: &str) -> Option<WrappedKey> {
    let [only] = recipients else {
        return None;
    };
    if !only.ok {
        return None;
    }

    let public_key = parse_public_key(&only.pubkey).ok()?;
    ecies::encrypt_eth(&public_key, canonical.as_bytes())
        .ok()
        .map(WrappedKey::Ecies)
}
