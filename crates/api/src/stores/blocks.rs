//! Content-addressed block store in the storage directory.
//!
//! Stands in for an embedded IPFS node: each object is a file named by its
//! CIDv1 (raw codec, sha2-256, base16) under `<storage_dir>/blocks/`, and is
//! handed out as `helia://<cid>`. Blocks survive restarts and are served back
//! through [`ContentStore::get`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;

use super::{EvidenceStore, StoredObject};

/// Multibase `f` (base16), CID version 1, raw codec 0x55, sha2-256 multihash 0x12 0x20.
const CID_V1_RAW_SHA256_PREFIX: &str = "f01551220";

pub const BLOCKS_DIR: &str = "blocks";

pub fn content_cid(bytes: &[u8]) -> String {
    format!("{CID_V1_RAW_SHA256_PREFIX}{}", hex::encode(Sha256::digest(bytes)))
}

/// Only CIDs this store could have produced; anything else never reaches the filesystem.
pub fn is_block_cid(cid: &str) -> bool {
    cid.strip_prefix(CID_V1_RAW_SHA256_PREFIX).is_some_and(|hash| {
        hash.len() == 64 && hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    })
}

/// Reads content-addressed objects back by CID.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn get(&self, cid: &str) -> Result<Option<Vec<u8>>>;
}

#[derive(Clone)]
pub struct BlockStore {
    dir: PathBuf,
}

impl BlockStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Blocks directory inside a storage directory.
    pub fn in_storage_dir(storage_dir: impl Into<PathBuf>) -> Self {
        Self::new(storage_dir.into().join(BLOCKS_DIR))
    }
}

#[async_trait]
impl EvidenceStore for BlockStore {
    fn name(&self) -> &'static str {
        "blocks"
    }

    async fn put(&self, bytes: &[u8], _filename: &str) -> Result<StoredObject> {
        let cid = content_cid(bytes);
        let path = self.dir.join(&cid);

        if !fs::try_exists(&path).await? {
            fs::create_dir_all(&self.dir)
                .await
                .with_context(|| format!("creating block dir {}", self.dir.display()))?;
            // Write then rename so a reader never sees a partial block.
            let partial = self.dir.join(format!(".{cid}.partial"));
            fs::write(&partial, bytes)
                .await
                .with_context(|| format!("writing {}", partial.display()))?;
            fs::rename(&partial, &path).await?;
        }

        Ok(StoredObject {
            uri: format!("helia://{cid}"),
            cid: Some(cid),
        })
    }
}

#[async_trait]
impl ContentStore for BlockStore {
    async fn get(&self, cid: &str) -> Result<Option<Vec<u8>>> {
        if !is_block_cid(cid) {
            return Ok(None);
        }
        match fs::read(self.dir.join(cid)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
