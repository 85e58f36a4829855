use serde::{Deserialize, Serialize};

/// CLI configuration, read from `EVIDENCE_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Hex private key used by `decrypt` when `--key` is not given.
    #[serde(default)]
    pub private_key: Option<String>,
}

fn default_api_url() -> String {
    "http://127.0.0.1:5001".into()
}

impl Config {
    /// The key to decrypt with: the flag wins over the environment.
    pub fn private_key<'a>(&'a self, flag: Option<&'a str>) -> anyhow::Result<&'a str> {
        flag.or(self.private_key.as_deref())
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow::anyhow!("No private key. Pass --key or set EVIDENCE_PRIVATE_KEY."))
    }
}
