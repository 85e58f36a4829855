//! Download a stored envelope by digest or `helia://` URI.

use std::path::Path;

use anyhow::Result;
use shared::api::EvidenceLookupResponse;

use crate::{api::Api, config::Config, ui};

/// The stored bytes as text: pretty JSON for envelopes, verbatim otherwise.
pub fn render(lookup: &EvidenceLookupResponse) -> Result<String> {
    match (&lookup.envelope, &lookup.envelope_raw) {
        (Some(envelope), _) => Ok(serde_json::to_string_pretty(envelope)?),
        (None, Some(raw)) => Ok(raw.clone()),
        (None, None) => anyhow::bail!("server returned an empty envelope for {}", lookup.file),
    }
}

/// `target` is a digest or a `helia://<cid>` URI returned by `submit`.
pub async fn run(config: &Config, target: &str, out: Option<&Path>) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let lookup = match target.strip_prefix("helia://") {
        Some(cid) => ui::spin("Fetching envelope...", api.get_evidence_by_cid(cid)).await?,
        None => ui::spin("Fetching envelope...", api.get_evidence(target)).await?,
    };
    let text = render(&lookup)?;

    match out {
        Some(path) => {
            std::fs::write(path, text)?;
            ui::success(&format!("Saved {} to {}", lookup.file, path.display()));
        }
        None => println!("{text}"),
    }

    Ok(())
}
