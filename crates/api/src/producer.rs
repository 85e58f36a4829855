//! Server-side envelope production.
//!
//! Turns a submission into a sealed envelope: resolve who may read it, seal,
//! then persist through the backend chain and record it in the index.

use chrono::Utc;
use shared::api::{IndexEntry, SubmitEvidencePayload};
use shared::envelope::{Envelope, Recipient, SealObserver, SealRequest, seal, seal_plaintext};
use shared::keccak256_hex;
use shared::keys::{address_from_public_key_hex, normalize_public_key};

use crate::recipients::{AdminKey, RecipientRegistry};
use crate::services::RoleDiscovery;
use crate::stores::{StoredObject, Stores};

/// Logs each step of sealing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl SealObserver for TracingObserver {
    fn recipient_wrapped(&self, address: &str) {
        tracing::debug!(recipient = address, "wrapped key for recipient");
    }

    fn recipient_failed(&self, address: &str, reason: &str) {
        tracing::warn!(recipient = address, reason, "could not wrap key for recipient");
    }

    fn recipient_skipped(&self, address: &str) {
        tracing::debug!(recipient = address, "duplicate recipient skipped");
    }

    fn envelope_sealed(&self, envelope: &Envelope) {
        tracing::info!(
            digest = envelope.digest.as_deref().unwrap_or("-"),
            recipients = envelope.recipients.len(),
            plaintext = envelope.is_plaintext(),
            "envelope sealed"
        );
    }
}

/// A caller-supplied public key that is not a valid secp256k1 point.
#[derive(Debug, thiserror::Error)]
#[error("invalid recipient public key: {0}")]
pub struct InvalidRecipientKey(pub String);

/// Everyone who should be able to open the envelope, in priority order:
/// explicit keys, the submitter's key, discovered contract parties, admin.
pub async fn resolve_recipients(
    payload: &SubmitEvidencePayload,
    discovery: &dyn RoleDiscovery,
    registry: &RecipientRegistry,
    admin: Option<&AdminKey>,
) -> Result<Vec<Recipient>, InvalidRecipientKey> {
    let mut recipients = Vec::new();

    let explicit = payload
        .recipient_public_keys
        .iter()
        .chain(payload.admin_pub.iter())
        .map(|key| key.trim())
        .filter(|key| !key.is_empty());
    for key in explicit {
        let public_key = normalize_public_key(key).map_err(|_| InvalidRecipientKey(key.to_string()))?;
        let address = address_from_public_key_hex(&public_key)
            .map_err(|_| InvalidRecipientKey(key.to_string()))?;
        recipients.push(Recipient::with_address(address, public_key));
    }

    if let Some(contract) = payload.contract_address.as_deref().filter(|c| !c.is_empty()) {
        for address in discovery.discover(contract).await {
            match registry.get(&address) {
                Some(public_key) => recipients.push(Recipient::with_address(address, public_key)),
                None => tracing::debug!(%address, "no public key known for contract party"),
            }
        }
    }

    if let Some(admin) = admin {
        recipients.push(Recipient::with_address(&admin.address, &admin.public_key));
    }

    Ok(recipients)
}

/// How a submission is to be sealed given the deployment's key setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealMode {
    Encrypted,
    /// No recipients and plaintext storage explicitly allowed.
    Plaintext,
    /// No admin key, plaintext storage not allowed.
    Refused,
}

pub fn seal_mode(has_admin: bool, allow_plaintext: bool, recipient_count: usize) -> SealMode {
    match (has_admin, allow_plaintext, recipient_count) {
        (true, _, _) => SealMode::Encrypted,
        (false, false, _) => SealMode::Refused,
        (false, true, 0) => SealMode::Plaintext,
        (false, true, _) => SealMode::Encrypted,
    }
}

pub fn seal_request(payload: &SubmitEvidencePayload, digest: &str, recipients: Vec<Recipient>, alternate_wrapping: bool) -> SealRequest {
    let mut request = SealRequest::new(payload.evidence_content(), recipients);
    request.digest = Some(digest.to_string());
    request.tx_hash = payload.tx_hash.clone();
    request.contract_address = payload.contract_address.clone();
    request.evidence_type = payload.evidence_type.clone();
    request.alternate_wrapping = alternate_wrapping;
    request
}

pub fn produce(request: &SealRequest, mode: SealMode, observer: &dyn SealObserver) -> anyhow::Result<Envelope> {
    match mode {
        SealMode::Plaintext => {
            tracing::warn!("no recipients and no admin key: storing evidence unencrypted");
            Ok(seal_plaintext(request, observer))
        }
        _ => Ok(seal(request, observer)?),
    }
}

/// Outcome of persisting one envelope.
#[derive(Debug, Clone)]
pub struct PersistedEnvelope {
    pub file: String,
    pub stored: StoredObject,
    pub entry: IndexEntry,
}

/// `<millis>-<digest without 0x>.json`
pub fn envelope_filename(digest: &str, millis: i64) -> String {
    let bare = digest.strip_prefix("0x").unwrap_or(digest);
    format!("{millis}-{bare}.json")
}

/// Stores the pretty-printed envelope through the backend chain, keeps a local
/// copy for digest lookup, and appends an index entry.
pub async fn persist(stores: &Stores, envelope: &Envelope, digest: &str) -> anyhow::Result<PersistedEnvelope> {
    let bytes = serde_json::to_vec_pretty(envelope)?;
    let now = Utc::now();
    let file = envelope_filename(digest, now.timestamp_millis());

    let stored = stores.evidence.put(&bytes, &file).await?;
    stores.archive.save_copy(&file, &bytes).await?;

    let entry = IndexEntry {
        digest: digest.to_string(),
        tx_hash: envelope.tx_hash.clone(),
        contract_address: envelope.contract_address.clone(),
        evidence_type: envelope.evidence_type.clone(),
        cid: stored.cid.clone(),
        uri: Some(stored.uri.clone()),
        recipients: envelope.recipient_addresses(),
        saved_at: Some(now),
        file_hash: Some(keccak256_hex(&bytes)),
        registered_at: None,
        reporter_address: None,
    };

    // The envelope is already stored; a lost index line must not fail the submission.
    if let Err(e) = stores.index.record_saved(&entry).await {
        tracing::error!(error = %e, digest, "failed to append evidence index entry");
    }

    Ok(PersistedEnvelope { file, stored, entry })
}
