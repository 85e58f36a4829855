use anyhow::Result;
use chrono::DateTime;

use crate::{api::Api, config::Config, ui};

pub async fn run(config: &Config) -> Result<()> {
    let api = Api::new(config.api_url.clone());
    let pong = ui::spin("Pinging...", api.ping()).await?;

    let server_time = DateTime::from_timestamp_millis(pong.ts)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| pong.ts.to_string());
    ui::success(&format!("{} is up", ui::bold(&config.api_url)));
    println!("{}", ui::field("Server time", &server_time));

    Ok(())
}
