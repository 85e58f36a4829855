//! Evidence submission and retrieval endpoints.
//!
//! ## Flow
//!
//! 1. Resolve recipients (explicit keys, submitter key, contract parties, admin)
//! 2. Seal the content into an envelope
//! 3. Store it through the backend chain, keep a local copy, append to the index
//!
//! ## Endpoints
//!
//! - POST /submit-evidence - Encrypt and store evidence
//! - GET /evidence/{digest} - Fetch a stored envelope by digest
//! - GET /evidence/cid/{cid} - Fetch a stored envelope by its `helia://` CID
//! - GET /evidence-index - List stored evidence, newest first
//! - POST /register-dispute - Link a dispute transaction to a digest

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use garde::Validate;
use shared::api::{
    EvidenceIndexQuery, EvidenceIndexResponse, EvidenceLookupResponse, RegisterDisputePayload,
    RegisterDisputeResponse, SubmitEvidencePayload, SubmitEvidenceResponse,
};

use crate::{
    error::AppError,
    producer::{self, SealMode},
    state::AppState,
    stores::DisputeRegistration,
};

const EVIDENCE_TYPES: &[&str] = &["appeal", "rationale"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/submit-evidence", post(submit_evidence))
        .route("/evidence/{digest}", get(get_evidence))
        .route("/evidence/cid/{cid}", get(get_evidence_by_cid))
        .route("/evidence-index", get(list_evidence))
        .route("/register-dispute", post(register_dispute))
}

/// Bare lowercase hex of a 32-byte digest, with or without `0x`.
fn bare_digest(digest: &str) -> Option<String> {
    let body = digest.trim();
    let body = body.strip_prefix("0x").unwrap_or(body).to_ascii_lowercase();
    (body.len() == 64 && body.chars().all(|c| c.is_ascii_hexdigit())).then_some(body)
}

#[debug_handler]
async fn submit_evidence(
    State(state): State<AppState>,
    Json(payload): Json<SubmitEvidencePayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.digest.as_deref().is_none_or(str::is_empty) {
        return Err(AppError::Validation("digest required".into()));
    }
    if !payload
        .evidence_type
        .as_deref()
        .is_some_and(|t| EVIDENCE_TYPES.contains(&t))
    {
        return Err(AppError::Validation(
            r#"type must be "appeal" or "rationale""#.into(),
        ));
    }
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let bare = payload
        .digest
        .as_deref()
        .and_then(bare_digest)
        .ok_or_else(|| AppError::Validation("invalid digest".into()))?;
    let digest = format!("0x{bare}");

    let recipients = producer::resolve_recipients(
        &payload,
        state.discovery.as_ref(),
        &state.registry,
        state.admin.as_ref(),
    )
    .await
    .map_err(|e| AppError::Validation(e.to_string()))?;

    let mode = producer::seal_mode(
        state.admin.is_some(),
        state.config.allow_plaintext_storage,
        recipients.len(),
    );
    if mode == SealMode::Refused {
        tracing::error!(%digest, "no admin public key configured; refusing to store evidence");
        return Err(AppError::External(
            StatusCode::SERVICE_UNAVAILABLE,
            "evidence encryption is not configured",
        ));
    }

    let request = producer::seal_request(
        &payload,
        &digest,
        recipients,
        state.config.alternate_wrapping,
    );
    let envelope = producer::produce(&request, mode, state.observer.as_ref())?;
    let persisted = producer::persist(&state.stores, &envelope, &digest).await?;

    tracing::info!(
        %digest,
        uri = %persisted.stored.uri,
        recipients = persisted.entry.recipients.len(),
        "evidence stored"
    );

    Ok(Json(SubmitEvidenceResponse {
        success: true,
        digest,
        cid: persisted.stored.cid,
        uri: persisted.stored.uri,
        recipients: persisted.entry.recipients,
        file: persisted.file,
    }))
}

#[debug_handler]
async fn get_evidence(
    State(state): State<AppState>,
    Path(digest): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bare = bare_digest(&digest).ok_or(AppError::External(StatusCode::NOT_FOUND, "not found"))?;

    let archived = state
        .stores
        .archive
        .find(&bare)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "not found"))?;

    Ok(Json(lookup_response(archived.file, &archived.bytes)))
}

#[debug_handler]
async fn get_evidence_by_cid(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let cid = cid.strip_prefix("helia://").unwrap_or(&cid).to_string();
    let bytes = state
        .stores
        .content
        .get(&cid)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "not found"))?;

    Ok(Json(lookup_response(cid, &bytes)))
}

/// Parsed envelope when the bytes are JSON, the raw text otherwise.
fn lookup_response(file: String, bytes: &[u8]) -> EvidenceLookupResponse {
    match serde_json::from_slice(bytes) {
        Ok(envelope) => EvidenceLookupResponse {
            file,
            envelope: Some(envelope),
            envelope_raw: None,
        },
        Err(_) => EvidenceLookupResponse {
            file,
            envelope: None,
            envelope_raw: Some(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

#[debug_handler]
async fn list_evidence(
    State(state): State<AppState>,
    Query(query): Query<EvidenceIndexQuery>,
) -> Result<impl IntoResponse, AppError> {
    let contract = query.contract_address.filter(|c| !c.is_empty());
    let entries = state.stores.index.list(contract).await?;

    Ok(Json(EvidenceIndexResponse { entries }))
}

#[debug_handler]
async fn register_dispute(
    State(state): State<AppState>,
    Json(payload): Json<RegisterDisputePayload>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(tx_hash), Some(digest)) = (payload.tx_hash.clone(), payload.digest.clone()) else {
        return Err(AppError::Validation("txHash and digest required".into()));
    };
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let registration = DisputeRegistration {
        digest: digest.to_ascii_lowercase(),
        tx_hash,
        cid: payload.cid,
        contract_address: payload.contract_address,
        reporter_address: payload.reporter_address,
        registered_at: Utc::now(),
    };

    let entry = state.stores.index.register(registration).await?;
    tracing::info!(digest = %entry.digest, "dispute registered");

    Ok(Json(RegisterDisputeResponse {
        success: true,
        entry,
    }))
}
