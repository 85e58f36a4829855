//! Submit evidence to the endpoint for encryption and storage.
//!
//! The server seals the content for every recipient it resolves (the keys
//! given here, the contract's parties, and its admin key), stores the
//! envelope, and returns where it ended up.

use anyhow::{Context, Result};
use serde_json::Value;
use shared::api::SubmitEvidencePayload;
use shared::{Payload, content_digest};

use crate::{api::Api, commands::read_arg_or_stdin, config::Config, ui};

pub struct SubmitArgs {
    /// Text, or JSON when `json` is set. `-` reads stdin.
    pub content: String,
    pub evidence_type: String,
    /// Defaults to the keccak256 of the canonical content.
    pub digest: Option<String>,
    pub json: bool,
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub recipients: Vec<String>,
    pub admin_pub: Option<String>,
}

/// Builds the request body. Content is resolved first so the default digest
/// covers exactly what is sent.
pub fn build_payload(args: &SubmitArgs, content: String) -> Result<SubmitEvidencePayload> {
    let content = if args.json {
        serde_json::from_str::<Value>(&content).context("content is not valid JSON")?
    } else {
        Value::String(content)
    };

    let digest = match &args.digest {
        Some(digest) => digest.clone(),
        None => content_digest(&Payload::from(content.clone())),
    };

    Ok(SubmitEvidencePayload {
        digest: Some(digest),
        evidence_type: Some(args.evidence_type.clone()),
        content,
        contract_address: args.contract_address.clone(),
        tx_hash: args.tx_hash.clone(),
        admin_pub: args.admin_pub.clone(),
        recipient_public_keys: args.recipients.clone(),
    })
}

pub async fn run(config: &Config, args: SubmitArgs) -> Result<()> {
    let content = read_arg_or_stdin(&args.content)?;
    let payload = build_payload(&args, content)?;

    let api = Api::new(config.api_url.clone());
    let response = ui::spin("Encrypting and storing...", api.submit_evidence(&payload)).await?;

    ui::success(&format!("Evidence stored: {}", ui::bold(&response.digest)));
    println!("{}", ui::field("URI", &response.uri));
    if let Some(cid) = &response.cid {
        println!("{}", ui::field("CID", cid));
    }
    println!("{}", ui::field("File", &response.file));
    if response.recipients.is_empty() {
        ui::warn("Stored without recipients (plaintext). Anyone with storage access can read it.");
    } else {
        println!("{}", ui::field("Recipients", &response.recipients.join(", ")));
    }

    Ok(())
}
