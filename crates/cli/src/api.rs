//! HTTP client for the evidence endpoint.

use anyhow::Result;
use reqwest::{Client, Response};
use shared::api::{
    EvidenceIndexQuery, EvidenceIndexResponse, EvidenceLookupResponse, PingResponse,
    RegisterDisputePayload, RegisterDisputeResponse, SubmitEvidencePayload,
    SubmitEvidenceResponse,
};

pub struct Api {
    pub http: Client,
    pub base_url: String,
}

impl Api {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Submits evidence for encryption and storage.
    pub async fn submit_evidence(
        &self,
        payload: &SubmitEvidencePayload,
    ) -> Result<SubmitEvidenceResponse> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/submit-evidence", self.base_url))
                .json(payload)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Fetches a stored envelope by digest.
    pub async fn get_evidence(&self, digest: &str) -> Result<EvidenceLookupResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/evidence/{}", self.base_url, digest))
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Fetches a stored envelope by the CID in its `helia://` URI.
    pub async fn get_evidence_by_cid(&self, cid: &str) -> Result<EvidenceLookupResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/evidence/cid/{}", self.base_url, cid))
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Lists the evidence index, optionally for one contract.
    pub async fn evidence_index(&self, query: &EvidenceIndexQuery) -> Result<EvidenceIndexResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/evidence-index", self.base_url))
                .query(query)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Links a dispute transaction to stored evidence.
    pub async fn register_dispute(
        &self,
        payload: &RegisterDisputePayload,
    ) -> Result<RegisterDisputeResponse> {
        let response = Self::check_response(
            self.http
                .post(format!("{}/register-dispute", self.base_url))
                .json(payload)
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    /// Liveness check.
    pub async fn ping(&self) -> Result<PingResponse> {
        let response = Self::check_response(
            self.http
                .get(format!("{}/ping", self.base_url))
                .send()
                .await?,
        )
        .await?;

        Ok(response.json().await?)
    }

    async fn check_response(response: Response) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Try to extract error message from JSON response
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|json| {
                    json.get("error")
                        .or_else(|| json.get("message"))
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                })
                .unwrap_or_else(|| {
                    if body.is_empty() {
                        status
                            .canonical_reason()
                            .unwrap_or("Request failed")
                            .to_string()
                    } else {
                        body
                    }
                });

            anyhow::bail!("{}", message);
        }

        Ok(response)
    }
}
