//! Evidence envelope protocol shared by the evidence API and the CLI.
//!
//! Evidence is encrypted once with AES-256-GCM; the symmetric key is then
//! wrapped per recipient with ECIES over secp256k1. Any recipient holding the
//! matching private key can open the envelope without further lookups.

pub mod api;
pub mod canonical;
pub mod cipher;
pub mod ecies;
pub mod envelope;
pub mod error;
pub mod keys;

pub use canonical::{Payload, canonicalize, content_digest, keccak256, keccak256_hex};
pub use envelope::{
    Envelope, NoopObserver, RecipientEntry, SealObserver, SealRequest,
    decrypt_envelope_with_private_key, seal, seal_plaintext,
};
pub use error::{DECRYPTION_FAILED, DecryptError, EnvelopeError};
