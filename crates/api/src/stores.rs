//! Evidence storage.
//!
//! ## Stores
//!
//! - **chain** - Ordered fallback over storage backends
//! - **ipfs** - Remote IPFS node via its HTTP API
//! - **blocks** - Content-addressed blocks in the storage directory
//!   (`helia://` URIs, served by CID)
//! - **local** - Storage directory on disk; also keeps the envelope copies
//!   that digest lookup reads
//! - **index** - Append-only evidence index (`index.jsonl`)
//!
//! ## Layout of the storage directory
//!
//! ```text
//! <millis>-<digest>.json   → pretty-printed envelope (local copy)
//! blocks/<cid>             → envelope bytes by content address
//! index.jsonl              → one `saved` / `registered` record per line
//! ```
//!
//! ## Usage in Handlers
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let stored = state.stores.evidence.put(&bytes, &filename).await?;
//!     state.stores.index.record_saved(&entry).await?;
//! }
//! ```

mod blocks;
mod chain;
mod evidence;
mod index;
mod ipfs;
mod local;

pub use blocks::{BlockStore, ContentStore, content_cid};
pub use chain::ChainedEvidenceStore;
pub use evidence::{ArchivedEnvelope, EnvelopeArchive, EvidenceStore, StoredObject};
pub use index::{DisputeRegistration, EvidenceIndex, JsonlIndex};
pub use ipfs::RemoteIpfsStore;
pub use local::LocalFileStore;

#[cfg(test)]
pub use blocks::MockContentStore;
#[cfg(test)]
pub use evidence::{MockEnvelopeArchive, MockEvidenceStore};
#[cfg(test)]
pub use index::MockEvidenceIndex;

use std::sync::Arc;

use crate::config::Config;

/// Collection of all stores.
#[derive(Clone)]
pub struct Stores {
    pub evidence: Arc<dyn EvidenceStore>,
    pub content: Arc<dyn ContentStore>,
    pub archive: Arc<dyn EnvelopeArchive>,
    pub index: Arc<dyn EvidenceIndex>,
}

impl Stores {
    /// Backend chain from config: remote IPFS (when configured), then the
    /// block store, then plain files in the storage directory.
    pub fn from_config(config: &Config) -> Self {
        let local = Arc::new(LocalFileStore::new(&config.storage_dir));
        let blocks = Arc::new(BlockStore::in_storage_dir(&config.storage_dir));

        let mut tiers: Vec<Arc<dyn EvidenceStore>> = Vec::new();
        if let Some(url) = config.ipfs_api_url.as_deref().filter(|url| !url.is_empty()) {
            tiers.push(Arc::new(RemoteIpfsStore::new(url)));
        }
        tiers.push(blocks.clone());
        tiers.push(local.clone());

        Self {
            evidence: Arc::new(ChainedEvidenceStore::new(tiers)),
            content: blocks,
            archive: local,
            index: Arc::new(JsonlIndex::new(&config.storage_dir)),
        }
    }
}
