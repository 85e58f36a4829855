//! Remote IPFS node over its HTTP API (`/api/v0/add`).

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::{EvidenceStore, StoredObject};

#[derive(Clone)]
pub struct RemoteIpfsStore {
    http: reqwest::Client,
    api_url: String,
}

#[derive(Deserialize)]
struct AddResponse {
    #[serde(rename = "Hash")]
    hash: String,
}

impl RemoteIpfsStore {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EvidenceStore for RemoteIpfsStore {
    fn name(&self) -> &'static str {
        "ipfs"
    }

    async fn put(&self, bytes: &[u8], filename: &str) -> Result<StoredObject> {
        let part = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str("application/json")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/api/v0/add", self.api_url))
            .query(&[("cid-version", "1")])
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("ipfs add failed ({status}): {body}");
        }

        let added: AddResponse = response.json().await?;
        if added.hash.is_empty() {
            bail!("ipfs add returned an empty hash");
        }

        Ok(StoredObject {
            uri: format!("ipfs://{}", added.hash),
            cid: Some(added.hash),
        })
    }
}
