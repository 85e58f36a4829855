//! Evidence storage backend abstraction.

use anyhow::Result;
use async_trait::async_trait;

/// Where a stored envelope ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Content identifier, for content-addressed backends.
    pub cid: Option<String>,
    /// `ipfs://`, `helia://` or `file://` URI.
    pub uri: String,
}

/// A backend that persists envelope bytes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Persist the bytes. `filename` is used by path-based backends.
    async fn put(&self, bytes: &[u8], filename: &str) -> Result<StoredObject>;
}

/// Local envelope copies, looked up by digest.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnvelopeArchive: Send + Sync {
    /// Write `filename` unless it already exists.
    async fn save_copy(&self, filename: &str, bytes: &[u8]) -> Result<()>;

    /// Newest file named `*-<digest>.json` (or `.bin`). `digest` has no `0x`.
    async fn find(&self, digest: &str) -> Result<Option<ArchivedEnvelope>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedEnvelope {
    pub file: String,
    pub bytes: Vec<u8>,
}
