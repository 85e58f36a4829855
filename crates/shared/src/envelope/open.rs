//! Envelope consumer.
//!
//! Given one private key, find a recipient entry it can unwrap and decrypt the
//! payload. Every failure mode ends in the same [`DecryptError::Failed`].

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use k256::SecretKey;
use serde_json::Value;

use super::{Envelope, RecipientEntry, WrappedKey};
use super::unwrap::{DEFAULT_CHAIN, KeyUnwrap, recover_symmetric_key};
use crate::cipher;
use crate::ecies;
use crate::error::DecryptError;
use crate::keys::{normalize_public_key, parse_private_key, public_key_hex};

/// Decrypts an envelope with a hex private key (`0x` optional).
///
/// Returns the payload as JSON when it parses, otherwise as a string.
pub fn decrypt_envelope_with_private_key(
    envelope: &Envelope,
    private_key: &str,
) -> Result<Value, DecryptError> {
    if envelope.is_plaintext() {
        return Ok(envelope
            .plaintext
            .as_ref()
            .map(plaintext_value)
            .unwrap_or(Value::Null));
    }

    let secret = parse_private_key(private_key).map_err(|_| DecryptError::InvalidPrivateKey)?;
    open_with_chain(envelope, &secret, DEFAULT_CHAIN).ok_or(DecryptError::Failed)
}

/// Opens with an explicit strategy chain.
pub fn open_with_chain(
    envelope: &Envelope,
    secret: &SecretKey,
    chain: &[&dyn KeyUnwrap],
) -> Option<Value> {
    let own_pubkey = public_key_hex(secret);
    let payload = EncryptedPayload::from_envelope(envelope);

    let matched = envelope
        .recipients
        .iter()
        .position(|entry| normalize_public_key(&entry.pubkey).is_ok_and(|pk| pk == own_pubkey));

    if let (Some(index), Some(payload)) = (matched, payload.as_ref()) {
        if let Some(value) = try_entry(&envelope.recipients[index], secret, chain, payload) {
            return Some(value);
        }
    }

    if let Some(value) = envelope
        .crypto
        .as_ref()
        .and_then(|crypto| try_legacy(crypto, secret))
    {
        return Some(value);
    }

    // Address and pubkey may disagree in older envelopes; try everything.
    let payload = payload?;
    envelope
        .recipients
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != matched)
        .find_map(|(_, entry)| try_entry(entry, secret, chain, &payload))
}

struct EncryptedPayload {
    iv: Vec<u8>,
    tag: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    fn from_envelope(envelope: &Envelope) -> Option<Self> {
        let aes = &envelope.encryption.as_ref()?.aes;
        Some(Self {
            iv: BASE64.decode(&aes.iv).ok()?,
            tag: BASE64.decode(&aes.tag).ok()?,
            ciphertext: BASE64.decode(envelope.ciphertext.as_ref()?).ok()?,
        })
    }
}

fn try_entry(
    entry: &RecipientEntry,
    secret: &SecretKey,
    chain: &[&dyn KeyUnwrap],
    payload: &EncryptedPayload,
) -> Option<Value> {
    [&entry.encrypted_key, &entry.encrypted_key_ecc]
        .into_iter()
        .flatten()
        .filter_map(WrappedKey::ciphertext)
        .find_map(|wrapped| {
            chain.iter().find_map(|strategy| {
                let bytes = strategy.unwrap_key(secret, &wrapped)?;
                let key = recover_symmetric_key(&bytes)?;
                cipher::decrypt(&key, &payload.iv, &payload.tag, &payload.ciphertext)
                    .ok()
                    .map(parse_plaintext)
            })
        })
}

fn try_legacy(crypto: &WrappedKey, secret: &SecretKey) -> Option<Value> {
    let wrapped = crypto.ciphertext()?;
    ecies::decrypt_eth(secret, &wrapped)
        .or_else(|_| ecies::decrypt_gcm(secret, &wrapped))
        .ok()
        .map(parse_plaintext)
}

fn parse_plaintext(bytes: Vec<u8>) -> Value {
    let text = String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

fn plaintext_value(value: &Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}
