//! AES-256-GCM payload cipher.
//!
//! The envelope stores the IV and the authentication tag next to the
//! ciphertext rather than appended to it, so encryption runs detached.

use aes_gcm::{
    Aes256Gcm, Key, KeyInit, Nonce, Tag,
    aead::{AeadInPlace, OsRng, rand_core::RngCore},
};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// The one-time symmetric key of an envelope. Zeroed on drop.
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Lowercase hex, the form that gets wrapped for each recipient.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Output of a detached AES-256-GCM encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayload {
    pub iv: [u8; IV_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: Vec<u8>,
}

/// Encrypts with a fresh random IV.
pub fn encrypt(key: &SymmetricKey, plaintext: &[u8]) -> Result<SealedPayload> {
    encrypt_raw(key.as_bytes(), plaintext)
}

/// Decrypts and authenticates. Any tag mismatch is an error.
pub fn decrypt(key: &SymmetricKey, iv: &[u8], tag: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    decrypt_raw(key.as_bytes(), iv, tag, ciphertext)
}

pub(crate) fn encrypt_raw(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<SealedPayload> {
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|_| CryptoError::Encryption)?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(SealedPayload {
        iv,
        tag: tag_bytes,
        ciphertext: buffer,
    })
}

pub(crate) fn decrypt_raw(
    key: &[u8; KEY_LEN],
    iv: &[u8],
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if iv.len() != IV_LEN {
        return Err(CryptoError::InvalidIvLength {
            expected: IV_LEN,
            actual: iv.len(),
        });
    }
    // A short tag can never authenticate.
    if tag.len() != TAG_LEN {
        return Err(CryptoError::Authentication);
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(iv),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| CryptoError::Authentication)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, b"Hello, world!").unwrap();

        assert_ne!(sealed.ciphertext, b"Hello, world!");
        let decrypted = decrypt(&key, &sealed.iv, &sealed.tag, &sealed.ciphertext).unwrap();
        assert_eq!(decrypted, b"Hello, world!");
    }

    #[test]
    fn test_ciphertext_excludes_tag() {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, b"12345").unwrap();
        assert_eq!(sealed.ciphertext.len(), 5);
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let key = SymmetricKey::generate();
        let a = encrypt(&key, b"same").unwrap();
        let b = encrypt(&key, b"same").unwrap();
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_decrypt_wrong_key_fails() {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, b"Hello, world!").unwrap();

        let wrong = SymmetricKey::generate();
        let result = decrypt(&wrong, &sealed.iv, &sealed.tag, &sealed.ciphertext);
        assert_eq!(result, Err(CryptoError::Authentication));
    }

    #[test]
    fn test_decrypt_tampered_ciphertext_fails() {
        let key = SymmetricKey::generate();
        let mut sealed = encrypt(&key, b"Hello, world!").unwrap();

        // Flip a bit in the ciphertext
        sealed.ciphertext[0] ^= 0x01;

        let result = decrypt(&key, &sealed.iv, &sealed.tag, &sealed.ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn test_decrypt_tampered_tag_fails() {
        let key = SymmetricKey::generate();
        let mut sealed = encrypt(&key, b"Hello, world!").unwrap();
        sealed.tag[15] ^= 0x80;

        let result = decrypt(&key, &sealed.iv, &sealed.tag, &sealed.ciphertext);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_lengths_are_rejected() {
        let key = SymmetricKey::generate();
        let sealed = encrypt(&key, b"x").unwrap();

        assert!(matches!(
            decrypt(&key, &sealed.iv[..8], &sealed.tag, &sealed.ciphertext),
            Err(CryptoError::InvalidIvLength { .. })
        ));
        assert_eq!(
            decrypt(&key, &sealed.iv, &sealed.tag[..12], &sealed.ciphertext),
            Err(CryptoError::Authentication)
        );
        assert!(SymmetricKey::from_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_key_hex_round_trip() {
        let key = SymmetricKey::generate();
        let hex_key = key.to_hex();
        assert_eq!(hex_key.len(), 64);

        let restored = SymmetricKey::from_slice(&hex::decode(&hex_key).unwrap()).unwrap();
        assert_eq!(restored.as_bytes(), key.as_bytes());
    }
}
