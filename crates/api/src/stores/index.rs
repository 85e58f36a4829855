//! Evidence index.
//!
//! An append-only JSON-lines log (`index.jsonl`). Each line is either a
//! `saved` record (one per stored envelope) or a `registered` record (a
//! dispute transaction linked to a digest). Appends are serialized through an
//! async mutex so concurrent submissions never lose entries; the current view
//! is rebuilt by folding the log on read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::api::IndexEntry;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const INDEX_FILE: &str = "index.jsonl";

/// A dispute transaction linked to stored evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRegistration {
    pub digest: String,
    pub tx_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_address: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvidenceIndex: Send + Sync {
    /// Record a newly stored envelope.
    async fn record_saved(&self, entry: &IndexEntry) -> Result<()>;

    /// Link a dispute to its digest. Returns the resulting entry.
    async fn register(&self, registration: DisputeRegistration) -> Result<IndexEntry>;

    /// All entries, newest first, optionally for one contract.
    async fn list(&self, contract_address: Option<String>) -> Result<Vec<IndexEntry>>;
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Record {
    Saved(IndexEntry),
    Registered(DisputeRegistration),
}

pub struct JsonlIndex {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlIndex {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(INDEX_FILE),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: &Record) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {}", self.path.display()))?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Entries in log order (oldest first).
    async fn fold(&self) -> Result<Vec<IndexEntry>> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Record>(line) {
                Ok(Record::Saved(entry)) => entries.push(entry),
                Ok(Record::Registered(registration)) => {
                    apply(&mut entries, &registration);
                }
                Err(e) => {
                    tracing::warn!(line = line_no + 1, error = %e, "skipping unreadable index line");
                }
            }
        }
        Ok(entries)
    }
}

/// Upsert onto the most recent entry for the digest, or start a new one.
fn apply(entries: &mut Vec<IndexEntry>, registration: &DisputeRegistration) -> usize {
    let existing = entries
        .iter()
        .rposition(|entry| entry.digest.eq_ignore_ascii_case(&registration.digest));

    match existing {
        Some(pos) => {
            let entry = &mut entries[pos];
            entry.tx_hash = Some(registration.tx_hash.clone());
            entry.registered_at = Some(registration.registered_at);
            if registration.cid.is_some() {
                entry.cid = registration.cid.clone();
            }
            if registration.contract_address.is_some() {
                entry.contract_address = registration.contract_address.clone();
            }
            if registration.reporter_address.is_some() {
                entry.reporter_address = registration.reporter_address.clone();
            }
            pos
        }
        None => {
            entries.push(IndexEntry {
                digest: registration.digest.clone(),
                tx_hash: Some(registration.tx_hash.clone()),
                contract_address: registration.contract_address.clone(),
                evidence_type: None,
                cid: registration.cid.clone(),
                uri: None,
                recipients: Vec::new(),
                saved_at: None,
                file_hash: None,
                registered_at: Some(registration.registered_at),
                reporter_address: registration.reporter_address.clone(),
            });
            entries.len() - 1
        }
    }
}

#[async_trait]
impl EvidenceIndex for JsonlIndex {
    async fn record_saved(&self, entry: &IndexEntry) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.append(&Record::Saved(entry.clone())).await
    }

    async fn register(&self, registration: DisputeRegistration) -> Result<IndexEntry> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.fold().await?;
        let pos = apply(&mut entries, &registration);
        self.append(&Record::Registered(registration)).await?;
        Ok(entries.swap_remove(pos))
    }

    async fn list(&self, contract_address: Option<String>) -> Result<Vec<IndexEntry>> {
        let entries = {
            let _guard = self.write_lock.lock().await;
            self.fold().await?
        };

        Ok(entries
            .into_iter()
            .rev()
            .filter(|entry| match &contract_address {
                Some(wanted) => entry
                    .contract_address
                    .as_deref()
                    .is_some_and(|addr| addr.eq_ignore_ascii_case(wanted)),
                None => true,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    const CONTRACT: &str = "0xAbCdEf0000000000000000000000000000000001";

    fn digest(n: u8) -> String {
        format!("0x{}", hex::encode([n; 32]))
    }

    fn saved(n: u8, contract: Option<&str>) -> IndexEntry {
        IndexEntry {
            digest: digest(n),
            tx_hash: None,
            contract_address: contract.map(str::to_string),
            evidence_type: Some("appeal".into()),
            cid: Some(format!("cid-{n}")),
            uri: Some(format!("ipfs://cid-{n}")),
            recipients: vec!["0x01".into()],
            saved_at: Some(Utc::now()),
            file_hash: Some("0xff".into()),
            registered_at: None,
            reporter_address: None,
        }
    }

    fn registration(n: u8) -> DisputeRegistration {
        DisputeRegistration {
            digest: digest(n),
            tx_hash: format!("0x{}", hex::encode([0xee; 32])),
            cid: None,
            contract_address: None,
            reporter_address: Some("0x00000000000000000000000000000000000000aa".into()),
            registered_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_index_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());

        assert!(index.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());

        index.record_saved(&saved(1, None)).await.unwrap();
        index.record_saved(&saved(2, None)).await.unwrap();

        let entries = index.list(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].digest, digest(2));
        assert_eq!(entries[1].digest, digest(1));
    }

    #[tokio::test]
    async fn filters_by_contract_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());

        index.record_saved(&saved(1, Some(CONTRACT))).await.unwrap();
        index.record_saved(&saved(2, None)).await.unwrap();

        let entries = index
            .list(Some(CONTRACT.to_lowercase()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].digest, digest(1));
    }

    #[tokio::test]
    async fn register_upserts_existing_entry() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());
        index.record_saved(&saved(1, Some(CONTRACT))).await.unwrap();

        let entry = index.register(registration(1)).await.unwrap();

        assert_eq!(entry.digest, digest(1));
        assert!(entry.tx_hash.is_some());
        assert!(entry.registered_at.is_some());
        // untouched fields survive
        assert_eq!(entry.cid.as_deref(), Some("cid-1"));
        assert_eq!(entry.contract_address.as_deref(), Some(CONTRACT));

        let entries = index.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], entry);
    }

    #[tokio::test]
    async fn register_unknown_digest_creates_entry() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());
        index.record_saved(&saved(1, None)).await.unwrap();

        let entry = index.register(registration(9)).await.unwrap();

        assert_eq!(entry.digest, digest(9));
        assert!(entry.saved_at.is_none());

        let entries = index.list(None).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].digest, digest(9));
    }

    #[tokio::test]
    async fn register_targets_most_recent_duplicate() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());
        index.record_saved(&saved(1, None)).await.unwrap();
        let mut newer = saved(1, None);
        newer.cid = Some("newer".into());
        index.record_saved(&newer).await.unwrap();

        let entry = index.register(registration(1)).await.unwrap();

        assert_eq!(entry.cid.as_deref(), Some("newer"));
        let entries = index.list(None).await.unwrap();
        assert!(entries[0].registered_at.is_some());
        assert!(entries[1].registered_at.is_none());
    }

    #[tokio::test]
    async fn concurrent_saves_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let index = Arc::new(JsonlIndex::new(dir.path()));

        let tasks: Vec<_> = (0..20u8)
            .map(|n| {
                let index = index.clone();
                tokio::spawn(async move { index.record_saved(&saved(n, None)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(index.list(None).await.unwrap().len(), 20);
    }

    #[tokio::test]
    async fn skips_corrupt_lines() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());
        index.record_saved(&saved(1, None)).await.unwrap();

        let mut file = OpenOptions::new()
            .append(true)
            .open(index.path())
            .await
            .unwrap();
        file.write_all(b"{not json\n").await.unwrap();
        drop(file);
        index.record_saved(&saved(2, None)).await.unwrap();

        assert_eq!(index.list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn log_lines_are_tagged() {
        let dir = TempDir::new().unwrap();
        let index = JsonlIndex::new(dir.path());
        index.record_saved(&saved(1, None)).await.unwrap();
        index.register(registration(1)).await.unwrap();

        let contents = std::fs::read_to_string(index.path()).unwrap();
        let kinds: Vec<String> = contents
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["kind"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(kinds, vec!["saved", "registered"]);
    }
}
