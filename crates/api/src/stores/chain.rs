//! Storage backend chain.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::{EvidenceStore, StoredObject};

/// Tries each backend in order and returns the first success.
pub struct ChainedEvidenceStore {
    tiers: Vec<Arc<dyn EvidenceStore>>,
}

impl ChainedEvidenceStore {
    pub fn new(tiers: Vec<Arc<dyn EvidenceStore>>) -> Self {
        Self { tiers }
    }
}

#[async_trait]
impl EvidenceStore for ChainedEvidenceStore {
    fn name(&self) -> &'static str {
        "chain"
    }

    async fn put(&self, bytes: &[u8], filename: &str) -> Result<StoredObject> {
        let mut last_error = None;

        for tier in &self.tiers {
            match tier.put(bytes, filename).await {
                Ok(stored) => {
                    tracing::debug!(backend = tier.name(), uri = %stored.uri, "evidence stored");
                    return Ok(stored);
                }
                Err(e) => {
                    tracing::warn!(backend = tier.name(), error = %e, "storage backend failed, falling back");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| anyhow!("no storage backend configured"))
            .context("all storage backends failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MockEvidenceStore;

    fn failing(name: &'static str) -> MockEvidenceStore {
        let mut store = MockEvidenceStore::new();
        store.expect_name().return_const(name);
        store
            .expect_put()
            .times(1)
            .returning(|_, _| Err(anyhow!("backend down")));
        store
    }

    fn succeeding(name: &'static str, uri: &'static str) -> MockEvidenceStore {
        let mut store = MockEvidenceStore::new();
        store.expect_name().return_const(name);
        store.expect_put().times(1).returning(move |_, _| {
            Ok(StoredObject {
                cid: None,
                uri: uri.to_string(),
            })
        });
        store
    }

    #[tokio::test]
    async fn first_success_wins() {
        let mut unused = MockEvidenceStore::new();
        unused.expect_put().never();

        let chain = ChainedEvidenceStore::new(vec![
            Arc::new(succeeding("remote", "ipfs://a")),
            Arc::new(unused),
        ]);

        let stored = chain.put(b"{}", "1-ab.json").await.unwrap();
        assert_eq!(stored.uri, "ipfs://a");
    }

    #[tokio::test]
    async fn falls_back_through_failures() {
        let chain = ChainedEvidenceStore::new(vec![
            Arc::new(failing("remote")),
            Arc::new(failing("blocks")),
            Arc::new(succeeding("local", "file:///tmp/1-ab.json")),
        ]);

        let stored = chain.put(b"{}", "1-ab.json").await.unwrap();
        assert_eq!(stored.uri, "file:///tmp/1-ab.json");
    }

    #[tokio::test]
    async fn fails_only_when_every_tier_fails() {
        let chain = ChainedEvidenceStore::new(vec![
            Arc::new(failing("remote")),
            Arc::new(failing("local")),
        ]);

        let err = chain.put(b"{}", "1-ab.json").await.unwrap_err();
        assert!(err.to_string().contains("all storage backends failed"));
    }

    #[tokio::test]
    async fn empty_chain_is_an_error() {
        let chain = ChainedEvidenceStore::new(vec![]);
        assert!(chain.put(b"{}", "x.json").await.is_err());
    }
}
