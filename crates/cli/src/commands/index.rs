//! List stored evidence, newest first.

use anyhow::Result;
use chrono_humanize::HumanTime;
use shared::api::{EvidenceIndexQuery, IndexEntry};
use tabled::{Table, Tabled, settings::Style};

use crate::{api::Api, config::Config, ui};

#[derive(Tabled)]
struct IndexRow {
    #[tabled(rename = "Digest")]
    digest: String,
    #[tabled(rename = "Type")]
    evidence_type: String,
    #[tabled(rename = "Recipients")]
    recipients: usize,
    #[tabled(rename = "Saved")]
    saved: String,
    #[tabled(rename = "Dispute tx")]
    tx_hash: String,
}

fn row(entry: IndexEntry) -> IndexRow {
    IndexRow {
        digest: ui::short_hex(&entry.digest),
        evidence_type: entry.evidence_type.unwrap_or_else(|| "-".into()),
        recipients: entry.recipients.len(),
        saved: entry
            .saved_at
            .map(|at| HumanTime::from(at).to_string())
            .unwrap_or_else(|| "-".into()),
        tx_hash: entry
            .tx_hash
            .as_deref()
            .map(ui::short_hex)
            .unwrap_or_else(|| "-".into()),
    }
}

pub async fn run(config: &Config, contract_address: Option<String>) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let query = EvidenceIndexQuery { contract_address };
    let index = ui::spin("Fetching index...", api.evidence_index(&query)).await?;

    if index.entries.is_empty() {
        println!("No evidence stored");
        return Ok(());
    }

    let rows: Vec<IndexRow> = index.entries.into_iter().map(row).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}
