//! ECIES over secp256k1 in the two wire formats found in stored envelopes.
//!
//! Both formats serialize to the same `{iv, ephemPublicKey, ciphertext, mac}`
//! hex object and differ only in key derivation and the symmetric layer:
//!
//! | format    | KDF over ECDH x        | cipher              | `mac`                      |
//! |-----------|------------------------|---------------------|----------------------------|
//! | GCM       | SHA-256                | AES-256-GCM, 12B iv | GCM tag                    |
//! | eth-crypto| SHA-512 (enc ‖ mac key)| AES-256-CBC, 16B iv | HMAC-SHA256(iv‖R‖ct)       |
//!
//! The ephemeral public key `R` is always written uncompressed.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use aes_gcm::aead::{OsRng, rand_core::RngCore};
use hmac::{Hmac, Mac};
use k256::{PublicKey, SecretKey, ecdh::EphemeralSecret};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

use crate::cipher::{self, KEY_LEN};
use crate::error::{CryptoError, Result};
use crate::keys::{parse_public_key, uncompressed_bytes};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

const CBC_IV_LEN: usize = 16;

/// A wrapped message in hex fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EciesCiphertext {
    pub iv: String,
    pub ephem_public_key: String,
    pub ciphertext: String,
    pub mac: String,
}

struct Decoded {
    iv: Vec<u8>,
    ephem: PublicKey,
    ciphertext: Vec<u8>,
    mac: Vec<u8>,
}

impl EciesCiphertext {
    fn decode(&self) -> Result<Decoded> {
        Ok(Decoded {
            iv: decode_hex(&self.iv, "iv")?,
            ephem: parse_public_key(&self.ephem_public_key)?,
            ciphertext: decode_hex(&self.ciphertext, "ciphertext")?,
            mac: decode_hex(&self.mac, "mac")?,
        })
    }
}

fn decode_hex(value: &str, field: &'static str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    hex::decode(body).map_err(|_| CryptoError::InvalidEncoding { field })
}

/// ECDH shared x-coordinate.
pub fn shared_x(secret: &SecretKey, public: &PublicKey) -> [u8; KEY_LEN] {
    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    let mut out = [0u8; KEY_LEN];
    out.copy_from_slice(shared.raw_secret_bytes());
    out
}

fn ephemeral_exchange(recipient: &PublicKey) -> (Vec<u8>, [u8; KEY_LEN]) {
    let ephemeral = EphemeralSecret::random(&mut OsRng);
    let ephem_public = uncompressed_bytes(&ephemeral.public_key());
    let shared = ephemeral.diffie_hellman(recipient);

    let mut x = [0u8; KEY_LEN];
    x.copy_from_slice(shared.raw_secret_bytes());
    (ephem_public, x)
}

fn sha256_key(x: &[u8]) -> [u8; KEY_LEN] {
    Sha256::digest(x).into()
}

/// Encrypts with the GCM format.
pub fn encrypt_gcm(recipient: &PublicKey, message: &[u8]) -> Result<EciesCiphertext> {
    let (ephem_public, x) = ephemeral_exchange(recipient);
    let sealed = cipher::encrypt_raw(&sha256_key(&x), message)?;

    Ok(EciesCiphertext {
        iv: hex::encode(sealed.iv),
        ephem_public_key: hex::encode(ephem_public),
        ciphertext: hex::encode(&sealed.ciphertext),
        mac: hex::encode(sealed.tag),
    })
}

pub fn decrypt_gcm(secret: &SecretKey, wrapped: &EciesCiphertext) -> Result<Vec<u8>> {
    let decoded = wrapped.decode()?;
    let x = shared_x(secret, &decoded.ephem);
    cipher::decrypt_raw(&sha256_key(&x), &decoded.iv, &decoded.mac, &decoded.ciphertext)
}

/// GCM format variant whose producer used the ECDH x-coordinate as the AES key
/// without hashing it.
pub fn decrypt_raw_ecdh_gcm(secret: &SecretKey, wrapped: &EciesCiphertext) -> Result<Vec<u8>> {
    let decoded = wrapped.decode()?;
    let x = shared_x(secret, &decoded.ephem);
    cipher::decrypt_raw(&x, &decoded.iv, &decoded.mac, &decoded.ciphertext)
}

fn eth_keys(x: &[u8]) -> ([u8; 32], [u8; 32]) {
    let hash = Sha512::digest(x);
    let mut enc_key = [0u8; 32];
    let mut mac_key = [0u8; 32];
    enc_key.copy_from_slice(&hash[..32]);
    mac_key.copy_from_slice(&hash[32..]);
    (enc_key, mac_key)
}

fn eth_mac(mac_key: &[u8], iv: &[u8], ephem_public: &[u8], ciphertext: &[u8]) -> Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key)
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: 32,
            actual: mac_key.len(),
        })?;
    mac.update(iv);
    mac.update(ephem_public);
    mac.update(ciphertext);
    Ok(mac)
}

/// Encrypts with the eth-crypto (eccrypto) format.
pub fn encrypt_eth(recipient: &PublicKey, message: &[u8]) -> Result<EciesCiphertext> {
    let (ephem_public, x) = ephemeral_exchange(recipient);
    let (enc_key, mac_key) = eth_keys(&x);

    let mut iv = [0u8; CBC_IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(&enc_key, &iv)
        .map_err(|_| CryptoError::Encryption)?
        .encrypt_padded_vec_mut::<Pkcs7>(message);
    let mac = eth_mac(&mac_key, &iv, &ephem_public, &ciphertext)?
        .finalize()
        .into_bytes();

    Ok(EciesCiphertext {
        iv: hex::encode(iv),
        ephem_public_key: hex::encode(ephem_public),
        ciphertext: hex::encode(&ciphertext),
        mac: hex::encode(mac),
    })
}

pub fn decrypt_eth(secret: &SecretKey, wrapped: &EciesCiphertext) -> Result<Vec<u8>> {
    let decoded = wrapped.decode()?;
    if decoded.iv.len() != CBC_IV_LEN {
        return Err(CryptoError::InvalidIvLength {
            expected: CBC_IV_LEN,
            actual: decoded.iv.len(),
        });
    }

    let x = shared_x(secret, &decoded.ephem);
    let (enc_key, mac_key) = eth_keys(&x);

    // MAC covers the uncompressed ephemeral key even if it was stored compressed.
    let ephem_public = uncompressed_bytes(&decoded.ephem);
    eth_mac(&mac_key, &decoded.iv, &ephem_public, &decoded.ciphertext)?
        .verify_slice(&decoded.mac)
        .map_err(|_| CryptoError::Authentication)?;

    Aes256CbcDec::new_from_slices(&enc_key, &decoded.iv)
        .map_err(|_| CryptoError::Authentication)?
        .decrypt_padded_vec_mut::<Pkcs7>(&decoded.ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
