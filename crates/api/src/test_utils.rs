//! Shared test utilities for API handler tests.
//!
//! Provides a flexible `TestStateBuilder` for constructing `AppState`
//! instances with only the mocks needed for each test.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::TestStateBuilder;
//!
//! let mut index = MockEvidenceIndex::new();
//! index.expect_list().returning(|_| Ok(vec![]));
//!
//! let state = TestStateBuilder::new()
//!     .with_index(index)
//!     .build();
//! ```

use std::sync::Arc;

use shared::envelope::NoopObserver;
use shared::keys::{GeneratedKeypair, generate_keypair};

use crate::config::Config;
use crate::recipients::{AdminKey, RecipientRegistry};
use crate::services::{MockRoleDiscovery, RoleDiscovery};
use crate::state::AppState;
use crate::stores::{
    ContentStore, EnvelopeArchive, EvidenceIndex, EvidenceStore, MockContentStore,
    MockEnvelopeArchive, MockEvidenceIndex, MockEvidenceStore, Stores,
};

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 5001,
        storage_dir: "evidence_storage_test".to_string(),
        rpc_url: "http://127.0.0.1:8545".to_string(),
        rpc_timeout_ms: 1_000,
        ipfs_api_url: None,
        admin_public_key: None,
        admin_public_key_file: None,
        admin_address: None,
        allow_plaintext_storage: false,
        recipient_pubkeys_json: None,
        recipient_pubkeys_file: None,
        alternate_wrapping: false,
        body_limit_bytes: 1024 * 1024,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// A fresh admin keypair and the matching `AdminKey`.
pub fn mock_admin() -> (GeneratedKeypair, AdminKey) {
    let pair = generate_keypair();
    let admin = AdminKey {
        address: pair.address.clone(),
        public_key: pair.public_key.clone(),
    };
    (pair, admin)
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for any store/service not explicitly set.
/// Real implementations (e.g. a tempdir-backed store) can be injected with
/// the `with_*_impl` methods.
pub struct TestStateBuilder {
    config: Config,
    evidence: Option<Arc<dyn EvidenceStore>>,
    content: Option<Arc<dyn ContentStore>>,
    archive: Option<Arc<dyn EnvelopeArchive>>,
    index: Option<Arc<dyn EvidenceIndex>>,
    discovery: Option<Arc<dyn RoleDiscovery>>,
    registry: RecipientRegistry,
    admin: Option<AdminKey>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            config: test_config(),
            evidence: None,
            content: None,
            archive: None,
            index: None,
            discovery: None,
            registry: RecipientRegistry::new(),
            admin: None,
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_evidence_store(mut self, store: MockEvidenceStore) -> Self {
        self.evidence = Some(Arc::new(store));
        self
    }

    pub fn with_evidence_store_impl(mut self, store: Arc<dyn EvidenceStore>) -> Self {
        self.evidence = Some(store);
        self
    }

    pub fn with_content_store(mut self, store: MockContentStore) -> Self {
        self.content = Some(Arc::new(store));
        self
    }

    pub fn with_content_store_impl(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.content = Some(store);
        self
    }

    pub fn with_archive(mut self, archive: MockEnvelopeArchive) -> Self {
        self.archive = Some(Arc::new(archive));
        self
    }

    pub fn with_archive_impl(mut self, archive: Arc<dyn EnvelopeArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn with_index(mut self, index: MockEvidenceIndex) -> Self {
        self.index = Some(Arc::new(index));
        self
    }

    pub fn with_index_impl(mut self, index: Arc<dyn EvidenceIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_discovery(mut self, discovery: MockRoleDiscovery) -> Self {
        self.discovery = Some(Arc::new(discovery));
        self
    }

    pub fn with_registry(mut self, registry: RecipientRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_admin(mut self, admin: AdminKey) -> Self {
        self.admin = Some(admin);
        self
    }

    /// Builds the `AppState` with configured or default mocks.
    pub fn build(self) -> AppState {
        AppState {
            config: self.config,
            stores: Stores {
                evidence: self
                    .evidence
                    .unwrap_or_else(|| Arc::new(MockEvidenceStore::new())),
                content: self
                    .content
                    .unwrap_or_else(|| Arc::new(MockContentStore::new())),
                archive: self
                    .archive
                    .unwrap_or_else(|| Arc::new(MockEnvelopeArchive::new())),
                index: self
                    .index
                    .unwrap_or_else(|| Arc::new(MockEvidenceIndex::new())),
            },
            discovery: self
                .discovery
                .unwrap_or_else(|| Arc::new(MockRoleDiscovery::new())),
            registry: Arc::new(self.registry),
            admin: self.admin,
            observer: Arc::new(NoopObserver),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
