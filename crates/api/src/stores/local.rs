//! Local filesystem storage.
//!
//! Last tier of the backend chain, and the home of the local envelope copies
//! that digest lookup reads.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;

use super::{ArchivedEnvelope, EnvelopeArchive, EvidenceStore, StoredObject};

#[derive(Clone)]
pub struct LocalFileStore {
    dir: PathBuf,
}

impl LocalFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the storage directory if needed.
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating storage dir {}", self.dir.display()))
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        // Filenames are generated server-side; reject anything path-like anyway.
        if filename.is_empty() || filename.contains(['/', '\\']) || filename.starts_with('.') {
            anyhow::bail!("invalid storage filename: {filename}");
        }
        Ok(self.dir.join(filename))
    }

    fn file_uri(path: &Path) -> String {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        format!("file://{}", absolute.display())
    }
}

#[async_trait]
impl EvidenceStore for LocalFileStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, bytes: &[u8], filename: &str) -> Result<StoredObject> {
        self.ensure_dir().await?;
        let path = self.path_for(filename)?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        Ok(StoredObject {
            cid: None,
            uri: Self::file_uri(&path),
        })
    }
}

#[async_trait]
impl EnvelopeArchive for LocalFileStore {
    async fn save_copy(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;
        let path = self.path_for(filename)?;
        if fs::try_exists(&path).await? {
            return Ok(());
        }
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("writing {}", path.display()))
    }

    async fn find(&self, digest: &str) -> Result<Option<ArchivedEnvelope>> {
        let json_suffix = format!("-{digest}.json");
        let bin_suffix = format!("-{digest}.bin");

        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(&json_suffix) || name.ends_with(&bin_suffix) {
                matches.push(name);
            }
        }

        // Millisecond prefix: the largest is the newest copy.
        let Some(file) = matches.into_iter().max_by_key(|name| millis_prefix(name)) else {
            return Ok(None);
        };

        let bytes = fs::read(self.dir.join(&file)).await?;
        Ok(Some(ArchivedEnvelope { file, bytes }))
    }
}

fn millis_prefix(name: &str) -> u64 {
    name.split('-')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .unwrap_or(0)
}
