use std::sync::Arc;

use shared::envelope::SealObserver;

use crate::{
    config::Config,
    recipients::{AdminKey, RecipientRegistry},
    services::RoleDiscovery,
    stores::Stores,
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Storage backends, local archive and evidence index.
    pub stores: Stores,
    /// On-chain party lookup.
    pub discovery: Arc<dyn RoleDiscovery>,
    /// Address → public key map for discovered parties.
    pub registry: Arc<RecipientRegistry>,
    /// Always-included recipient. `None` means fail closed.
    pub admin: Option<AdminKey>,
    /// Receives sealing progress.
    pub observer: Arc<dyn SealObserver>,
}
