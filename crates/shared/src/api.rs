//! Shared API request/response types used by both CLI and API server.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Max explicit recipients per submission.
const MAX_RECIPIENTS: usize = 50;

/// Submit a piece of evidence for encryption and storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvidencePayload {
    /// On-chain reference digest (keccak256); also the storage key.
    #[garde(required, pattern(r"^0x[0-9a-fA-F]{64}$"))]
    pub digest: Option<String>,
    /// `appeal` or `rationale`.
    #[serde(rename = "type")]
    #[garde(required, pattern(r"^(appeal|rationale)$"))]
    pub evidence_type: Option<String>,
    /// Text or any JSON value. Read it through [`Self::evidence_content`].
    #[serde(default)]
    #[garde(skip)]
    pub content: Value,
    /// Contract whose roles become recipients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(pattern(r"^0x[0-9a-fA-F]{40}$"))]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub tx_hash: Option<String>,
    /// Extra recipient public key, usually the submitting admin's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(skip)]
    pub admin_pub: Option<String>,
    /// Explicit recipient public keys, any secp256k1 encoding.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[garde(length(max = MAX_RECIPIENTS))]
    pub recipient_public_keys: Vec<String>,
}

impl SubmitEvidencePayload {
    /// The content to seal. A missing or falsy `content` (`null`, `false`,
    /// `0`) is sealed as the empty string, as the web frontend does.
    pub fn evidence_content(&self) -> Value {
        let falsy = match &self.content {
            Value::Null | Value::Bool(false) => true,
            Value::Number(n) => n.as_f64() == Some(0.0),
            _ => false,
        };
        if falsy {
            Value::String(String::new())
        } else {
            self.content.clone()
        }
    }
}

/// Returned after evidence is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitEvidenceResponse {
    pub success: bool,
    pub digest: String,
    pub cid: Option<String>,
    pub uri: String,
    /// Addresses of the recipient entries, in envelope order.
    pub recipients: Vec<String>,
    /// Name of the local envelope copy.
    pub file: String,
}

/// A stored envelope, returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceLookupResponse {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope: Option<Value>,
    /// Set instead of `envelope` when the stored bytes are not JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub envelope_raw: Option<String>,
}

/// One row of the evidence index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub digest: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(rename = "type", default)]
    pub evidence_type: Option<String>,
    #[serde(default)]
    pub cid: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// keccak256 of the stored envelope bytes.
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter_address: Option<String>,
}

/// Query parameters for the evidence index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceIndexQuery {
    /// Only entries for this contract (case-insensitive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceIndexResponse {
    pub entries: Vec<IndexEntry>,
}

/// Link an on-chain dispute transaction to stored evidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDisputePayload {
    #[garde(required, pattern(r"^0x[0-9a-fA-F]{64}$"))]
    pub tx_hash: Option<String>,
    #[garde(required, pattern(r"^0x[0-9a-fA-F]{64}$"))]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(length(min = 1, max = 128))]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(pattern(r"^0x[0-9a-fA-F]{40}$"))]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[garde(pattern(r"^0x[0-9a-fA-F]{40}$"))]
    pub reporter_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDisputeResponse {
    pub success: bool,
    pub entry: IndexEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub ok: bool,
    pub storage_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub ok: bool,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DIGEST: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    fn submit(value: Value) -> SubmitEvidencePayload {
        serde_json::from_value(value).unwrap()
    }

    // Submission shape - what the endpoint rejects with 400
    mod submit_evidence {
        use super::*;

        #[test]
        fn accepts_minimal_submission() {
            let payload = submit(json!({ "digest": DIGEST, "type": "appeal", "content": "x" }));
            assert!(payload.validate().is_ok());
        }

        #[test]
        fn rejects_missing_digest() {
            let payload = submit(json!({ "type": "appeal", "content": "x" }));
            assert!(payload.validate().is_err());
        }

        #[test]
        fn rejects_malformed_digest() {
            let payload = submit(json!({ "digest": "../../etc/passwd", "type": "appeal" }));
            assert!(payload.validate().is_err());
        }

        #[test]
        fn rejects_unknown_type() {
            let payload = submit(json!({ "digest": DIGEST, "type": "complaint" }));
            assert!(payload.validate().is_err());

            let payload = submit(json!({ "digest": DIGEST }));
            assert!(payload.validate().is_err());
        }

        #[test]
        fn accepts_rationale() {
            let payload = submit(json!({ "digest": DIGEST, "type": "rationale" }));
            assert!(payload.validate().is_ok());
        }

        #[test]
        fn rejects_bad_contract_address() {
            let payload = submit(json!({
                "digest": DIGEST,
                "type": "appeal",
                "contractAddress": "0x1234"
            }));
            assert!(payload.validate().is_err());
        }

        #[test]
        fn rejects_too_many_recipients() {
            let keys: Vec<String> = (0..51).map(|i| format!("04{i:0128}")).collect();
            let payload = submit(json!({
                "digest": DIGEST,
                "type": "appeal",
                "recipientPublicKeys": keys
            }));
            assert!(payload.validate().is_err());
        }

        #[test]
        fn reads_camel_case_fields() {
            let payload = submit(json!({
                "digest": DIGEST,
                "type": "appeal",
                "content": { "a": 1 },
                "txHash": "0xabc",
                "adminPub": "04ff",
                "recipientPublicKeys": ["04aa"]
            }));
            assert_eq!(payload.tx_hash.as_deref(), Some("0xabc"));
            assert_eq!(payload.admin_pub.as_deref(), Some("04ff"));
            assert_eq!(payload.recipient_public_keys, vec!["04aa"]);
            assert_eq!(payload.content, json!({ "a": 1 }));
        }

        #[test]
        fn missing_content_seals_as_empty_text() {
            let payload = submit(json!({ "digest": DIGEST, "type": "appeal" }));
            assert_eq!(payload.evidence_content(), json!(""));

            let payload = submit(json!({ "digest": DIGEST, "type": "appeal", "content": null }));
            assert_eq!(payload.evidence_content(), json!(""));
        }

        #[test]
        fn present_content_is_kept() {
            let payload = submit(json!({ "digest": DIGEST, "type": "appeal", "content": { "a": 0 } }));
            assert_eq!(payload.evidence_content(), json!({ "a": 0 }));

            let payload = submit(json!({ "digest": DIGEST, "type": "appeal", "content": 7 }));
            assert_eq!(payload.evidence_content(), json!(7));
        }
    }

    mod register_dispute {
        use super::*;

        #[test]
        fn requires_tx_hash_and_digest() {
            let payload: RegisterDisputePayload =
                serde_json::from_value(json!({ "digest": DIGEST })).unwrap();
            assert!(payload.validate().is_err());

            let payload: RegisterDisputePayload =
                serde_json::from_value(json!({ "digest": DIGEST, "txHash": DIGEST })).unwrap();
            assert!(payload.validate().is_ok());
        }

        #[test]
        fn validates_reporter_address() {
            let payload: RegisterDisputePayload = serde_json::from_value(json!({
                "digest": DIGEST,
                "txHash": DIGEST,
                "reporterAddress": "nope"
            }))
            .unwrap();
            assert!(payload.validate().is_err());
        }
    }

    #[test]
    fn index_entry_tolerates_sparse_rows() {
        let entry: IndexEntry = serde_json::from_value(json!({
            "digest": DIGEST,
            "txHash": null,
            "registeredAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        assert!(entry.recipients.is_empty());
        assert!(entry.registered_at.is_some());
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["type"], Value::Null);
        assert!(back.get("reporterAddress").is_none());
    }

    #[test]
    fn lookup_response_uses_camel_case() {
        let response = EvidenceLookupResponse {
            file: "1-ab.json".into(),
            envelope: None,
            envelope_raw: Some("raw".into()),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["envelopeRaw"], "raw");
        assert!(value.get("envelope").is_none());
    }
}
