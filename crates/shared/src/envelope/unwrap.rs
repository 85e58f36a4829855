//! Key-unwrap strategies and symmetric key recovery.
//!
//! Envelopes in storage were written by several producers. Each strategy
//! knows one ECIES variant; the consumer walks them in priority order and
//! feeds every output through [`recover_symmetric_key`], since producers also
//! disagreed on how the wrapped key itself was encoded.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use k256::SecretKey;

use crate::cipher::{KEY_LEN, SymmetricKey};
use crate::ecies::{self, EciesCiphertext};

/// One way of turning a wrapped key back into bytes.
pub trait KeyUnwrap: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decrypted bytes, or `None` if this variant does not apply.
    fn unwrap_key(&self, secret: &SecretKey, wrapped: &EciesCiphertext) -> Option<Vec<u8>>;
}

/// SHA-256 KDF + AES-256-GCM.
pub struct GcmUnwrap;

impl KeyUnwrap for GcmUnwrap {
    fn name(&self) -> &'static str {
        "ecies-gcm"
    }

    fn unwrap_key(&self, secret: &SecretKey, wrapped: &EciesCiphertext) -> Option<Vec<u8>> {
        ecies::decrypt_gcm(secret, wrapped).ok()
    }
}

/// SHA-512 KDF + AES-256-CBC + HMAC-SHA256.
pub struct EthCryptoUnwrap;

impl KeyUnwrap for EthCryptoUnwrap {
    fn name(&self) -> &'static str {
        "eth-crypto"
    }

    fn unwrap_key(&self, secret: &SecretKey, wrapped: &EciesCiphertext) -> Option<Vec<u8>> {
        ecies::decrypt_eth(secret, wrapped).ok()
    }
}

/// Un-hashed ECDH x-coordinate + AES-256-GCM.
pub struct RawEcdhUnwrap;

impl KeyUnwrap for RawEcdhUnwrap {
    fn name(&self) -> &'static str {
        "raw-ecdh-gcm"
    }

    fn unwrap_key(&self, secret: &SecretKey, wrapped: &EciesCiphertext) -> Option<Vec<u8>> {
        ecies::decrypt_raw_ecdh_gcm(secret, wrapped).ok()
    }
}

/// Strategies in the order the consumer tries them.
pub static DEFAULT_CHAIN: &[&dyn KeyUnwrap] = &[&GcmUnwrap, &EthCryptoUnwrap, &RawEcdhUnwrap];

fn exact(bytes: Vec<u8>) -> Option<SymmetricKey> {
    if bytes.len() == KEY_LEN {
        SymmetricKey::from_slice(&bytes).ok()
    } else {
        None
    }
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x").unwrap_or(text)
}

/// Recovers a 32-byte key from unwrapped output of unknown encoding.
///
/// Tried in order: raw bytes, hex, base64, UTF-8 bytes, hex-of-hex. The first
/// candidate of exactly 32 bytes wins.
pub fn recover_symmetric_key(bytes: &[u8]) -> Option<SymmetricKey> {
    if bytes.len() == KEY_LEN {
        return SymmetricKey::from_slice(bytes).ok();
    }

    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();

    hex::decode(strip_hex_prefix(trimmed))
        .ok()
        .and_then(exact)
        .or_else(|| BASE64.decode(trimmed).ok().and_then(exact))
        .or_else(|| exact(trimmed.as_bytes().to_vec()))
        .or_else(|| double_hex(trimmed))
}

// Legacy producers hex-encoded the hex string of the key.
fn double_hex(text: &str) -> Option<SymmetricKey> {
    let inner = hex::decode(strip_hex_prefix(text)).ok()?;
    let inner = std::str::from_utf8(&inner).ok()?;
    hex::decode(strip_hex_prefix(inner.trim())).ok().and_then(exact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::aead::OsRng;

    #[test]
    fn recovers_every_known_encoding() {
        let key = SymmetricKey::generate();
        let raw = key.as_bytes().to_vec();
        let hex_text = key.to_hex();
        let candidates: Vec<Vec<u8>> = vec![
            raw.clone(),
            hex_text.clone().into_bytes(),
            format!("0x{hex_text}").into_bytes(),
            BASE64.encode(&raw).into_bytes(),
            hex::encode(hex_text.as_bytes()).into_bytes(),
        ];

        for candidate in candidates {
            let recovered = recover_symmetric_key(&candidate).unwrap();
            assert_eq!(recovered.as_bytes(), key.as_bytes());
        }
    }

    #[test]
    fn accepts_32_char_text_as_bytes() {
        let text = "abcdefghijklmnopqrstuvwxyz012345";
        let recovered = recover_symmetric_key(text.as_bytes()).unwrap();
        assert_eq!(recovered.as_bytes(), text.as_bytes());
    }

    #[test]
    fn rejects_wrong_lengths() {
        assert!(recover_symmetric_key(b"short").is_none());
        assert!(recover_symmetric_key(hex::encode([7u8; 15]).as_bytes()).is_none());
        assert!(recover_symmetric_key(&[1u8; 33]).is_none());
    }

    #[test]
    fn chain_order_is_stable() {
        let names: Vec<_> = DEFAULT_CHAIN.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["ecies-gcm", "eth-crypto", "raw-ecdh-gcm"]);
    }

    #[test]
    fn each_strategy_handles_its_own_format() {
        let secret = SecretKey::random(&mut OsRng);
        let public = secret.public_key();

        let gcm = ecies::encrypt_gcm(&public, b"k").unwrap();
        let eth = ecies::encrypt_eth(&public, b"k").unwrap();

        assert_eq!(GcmUnwrap.unwrap_key(&secret, &gcm), Some(b"k".to_vec()));
        assert_eq!(EthCryptoUnwrap.unwrap_key(&secret, &eth), Some(b"k".to_vec()));
        assert_eq!(GcmUnwrap.unwrap_key(&secret, &eth), None);
        assert_eq!(RawEcdhUnwrap.unwrap_key(&secret, &gcm), None);
    }
}
