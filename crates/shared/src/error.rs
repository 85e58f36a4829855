//! Error types for the envelope protocol.

use thiserror::Error;

/// The single message surfaced for every failed decrypt attempt.
pub const DECRYPTION_FAILED: &str =
    "Decryption failed: no recipient matched or authentication failed";

/// Key parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secp256k1 public key")]
    InvalidPublicKey,

    #[error("invalid secp256k1 private key")]
    InvalidPrivateKey,
}

/// Symmetric and ECIES primitive failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid iv length: expected {expected}, got {actual}")]
    InvalidIvLength { expected: usize, actual: usize },

    #[error("invalid {field} encoding")]
    InvalidEncoding { field: &'static str },

    #[error("encryption failed")]
    Encryption,

    /// Tag or MAC mismatch. Never carries detail.
    #[error("authentication failed")]
    Authentication,

    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Errors raised while building an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    #[error("payload encryption failed: {0}")]
    Payload(#[from] CryptoError),

    #[error("envelope serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised while opening an envelope.
///
/// Everything other than a malformed private key collapses into
/// [`DecryptError::Failed`] so callers cannot probe which recipients exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("{}", DECRYPTION_FAILED)]
    Failed,
}

pub type Result<T, E = CryptoError> = std::result::Result<T, E>;
