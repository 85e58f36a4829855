//! Link an on-chain dispute transaction to stored evidence.

use anyhow::Result;
use shared::api::RegisterDisputePayload;

use crate::{api::Api, config::Config, ui};

pub async fn run(config: &Config, payload: RegisterDisputePayload) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let response = ui::spin("Registering dispute...", api.register_dispute(&payload)).await?;
    let entry = response.entry;

    ui::success(&format!("Dispute registered for {}", ui::bold(&entry.digest)));
    if let Some(tx_hash) = &entry.tx_hash {
        println!("{}", ui::field("Transaction", tx_hash));
    }
    if let Some(cid) = &entry.cid {
        println!("{}", ui::field("CID", cid));
    }
    if entry.saved_at.is_none() {
        ui::info("No stored evidence matched this digest yet; a new index entry was created.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestContext;
    use serde_json::json;
    use wiremock::{
        Mock, ResponseTemplate,
        matchers::{body_partial_json, method, path},
    };

    const DIGEST: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const TX: &str = "0x2222222222222222222222222222222222222222222222222222222222222222";

    #[tokio::test]
    async fn posts_registration() {
        let ctx = TestContext::new().await;
        Mock::given(method("POST"))
            .and(path("/register-dispute"))
            .and(body_partial_json(json!({ "txHash": TX, "digest": DIGEST })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "entry": { "digest": DIGEST, "txHash": TX, "registeredAt": "2026-01-01T00:00:00Z" },
            })))
            .expect(1)
            .mount(&ctx.mock_server)
            .await;

        let payload = RegisterDisputePayload {
            tx_hash: Some(TX.into()),
            digest: Some(DIGEST.into()),
            ..Default::default()
        };

        run(&ctx.config, payload).await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_missing_fields_error() {
        let ctx = TestContext::new().await;
        Mock::given(method("POST"))
            .and(path("/register-dispute"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "txHash and digest required" })),
            )
            .mount(&ctx.mock_server)
            .await;

        let err = run(&ctx.config, RegisterDisputePayload::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "txHash and digest required");
    }
}
