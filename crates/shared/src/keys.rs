//! secp256k1 key parsing, normalization and Ethereum address derivation.
//!
//! Public keys arrive in every shape the ecosystem produces: `0x`-prefixed,
//! raw 64-byte X‖Y, compressed, or uncompressed. Everything is normalized to
//! uncompressed, `04`-prefixed, lowercase hex before it is stored in an
//! envelope or compared.

use aes_gcm::aead::OsRng;
use k256::{PublicKey, SecretKey, elliptic_curve::sec1::ToEncodedPoint};

use crate::canonical::keccak256;
use crate::error::KeyError;

/// Length of an uncompressed public key in hex, including the `04` prefix.
pub const UNCOMPRESSED_HEX_LEN: usize = 130;

fn strip_0x(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Parses a public key in any supported encoding.
pub fn parse_public_key(input: &str) -> Result<PublicKey, KeyError> {
    let hex_str = strip_0x(input).to_ascii_lowercase();
    let bytes = hex::decode(&hex_str).map_err(|_| KeyError::InvalidPublicKey)?;

    let sec1 = match bytes.len() {
        // Raw X‖Y without the SEC1 tag
        64 => [&[0x04][..], &bytes].concat(),
        33 | 65 => bytes,
        _ => return Err(KeyError::InvalidPublicKey),
    };

    PublicKey::from_sec1_bytes(&sec1).map_err(|_| KeyError::InvalidPublicKey)
}

/// Uncompressed SEC1 bytes (65 bytes, `04` prefix).
pub fn uncompressed_bytes(key: &PublicKey) -> Vec<u8> {
    key.to_encoded_point(false).as_bytes().to_vec()
}

/// Uncompressed, `04`-prefixed, lowercase hex form of a public key.
pub fn public_key_to_hex(key: &PublicKey) -> String {
    hex::encode(uncompressed_bytes(key))
}

/// Normalizes any supported public key encoding to uncompressed lowercase hex.
pub fn normalize_public_key(input: &str) -> Result<String, KeyError> {
    parse_public_key(input).map(|key| public_key_to_hex(&key))
}

/// Parses a private key given as hex, with or without `0x`.
pub fn parse_private_key(input: &str) -> Result<SecretKey, KeyError> {
    let bytes = hex::decode(strip_0x(input)).map_err(|_| KeyError::InvalidPrivateKey)?;
    if bytes.len() != 32 {
        return Err(KeyError::InvalidPrivateKey);
    }
    SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)
}

/// Derives the normalized public key for a private key.
pub fn public_key_hex(secret: &SecretKey) -> String {
    public_key_to_hex(&secret.public_key())
}

/// Ethereum address of a public key: last 20 bytes of keccak256(X‖Y).
pub fn address_from_public_key(key: &PublicKey) -> String {
    let uncompressed = uncompressed_bytes(key);
    let hash = keccak256(&uncompressed[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// Ethereum address for a public key given in any supported encoding.
pub fn address_from_public_key_hex(input: &str) -> Result<String, KeyError> {
    parse_public_key(input).map(|key| address_from_public_key(&key))
}

/// Canonical address form: `0x` prefix, lowercase, 40 hex chars.
pub fn canonicalize_address(input: &str) -> Option<String> {
    let body = strip_0x(input).to_ascii_lowercase();
    if body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{}", body))
    } else {
        None
    }
}

/// A freshly generated keypair in the hex encodings the tooling prints.
#[derive(Debug, Clone)]
pub struct GeneratedKeypair {
    pub private_key: String,
    pub public_key: String,
    pub address: String,
}

pub fn generate_keypair() -> GeneratedKeypair {
    let secret = SecretKey::random(&mut OsRng);
    let public = secret.public_key();

    GeneratedKeypair {
        private_key: format!("0x{}", hex::encode(secret.to_bytes())),
        public_key: public_key_to_hex(&public),
        address: address_from_public_key(&public),
    }
}
