mod api;
mod commands;
mod config;
mod ui;

#[cfg(test)]
mod test;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use shared::api::RegisterDisputePayload;

use crate::commands::{decrypt::Source, submit::SubmitArgs};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "evidence")]
#[command(about = "Encrypted dispute evidence: submit, fetch, decrypt")]
#[command(version)]
#[command(after_help = "Examples:
  evidence keygen                                 Create a recipient keypair
  evidence submit --to 04ab.. 'the goods never arrived'
  evidence index                                  List stored evidence
  evidence decrypt 0x1234..                       Decrypt with EVIDENCE_PRIVATE_KEY")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit evidence for encryption and storage
    #[command(after_help = "Examples:
  evidence submit --to 04ab.. 'the goods never arrived'
  evidence submit --type rationale --contract 0xabc.. 'ruling notes'
  evidence submit --json '{\"claim\":\"deposit\",\"amount\":900}'
  cat statement.txt | evidence submit -")]
    Submit {
        /// The evidence (use '-' to read from stdin)
        content: String,
        /// Evidence kind
        #[arg(long = "type", default_value = "appeal", value_parser = ["appeal", "rationale"])]
        evidence_type: String,
        /// Evidence digest (defaults to keccak256 of the canonical content)
        #[arg(long)]
        digest: Option<String>,
        /// Parse the content as JSON instead of sending it as text
        #[arg(long)]
        json: bool,
        /// Escrow contract whose parties should receive the evidence
        #[arg(long = "contract")]
        contract_address: Option<String>,
        /// Related transaction hash
        #[arg(long)]
        tx_hash: Option<String>,
        /// Recipient public key (use multiple times for multiple recipients)
        #[arg(short = 't', long = "to")]
        to: Vec<String>,
        /// Extra admin public key to include as a recipient
        #[arg(long)]
        admin_pub: Option<String>,
    },

    /// Download a stored envelope
    #[command(after_help = "Examples:
  evidence fetch 0x1234..
  evidence fetch 0x1234.. --out envelope.json
  evidence fetch helia://f01551220..")]
    Fetch {
        /// Evidence digest, or the helia:// URI printed by submit
        digest: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Decrypt evidence with a private key
    #[command(after_help = "Examples:
  evidence decrypt 0x1234..
  evidence decrypt --file envelope.json --key 0xabcd..")]
    Decrypt {
        /// Evidence digest to fetch
        #[arg(required_unless_present = "file", conflicts_with = "file")]
        digest: Option<String>,
        /// Decrypt a local envelope file instead
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Private key (defaults to EVIDENCE_PRIVATE_KEY)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// List stored evidence, newest first
    #[command(after_help = "Examples:
  evidence index
  evidence index --contract 0xabc..")]
    Index {
        /// Only show evidence for this contract
        #[arg(long = "contract")]
        contract_address: Option<String>,
    },

    /// Link a dispute transaction to stored evidence
    #[command(after_help = "Example: evidence register --tx-hash 0x99.. --digest 0x1234..")]
    Register {
        /// Dispute transaction hash
        #[arg(long)]
        tx_hash: String,
        /// Evidence digest
        #[arg(long)]
        digest: String,
        #[arg(long)]
        cid: Option<String>,
        #[arg(long = "contract")]
        contract_address: Option<String>,
        /// Address of the party raising the dispute
        #[arg(long = "reporter")]
        reporter_address: Option<String>,
    },

    /// Generate a secp256k1 keypair
    #[command(after_help = "Examples:
  evidence keygen
  evidence keygen --json > key.json")]
    Keygen {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the endpoint is reachable
    #[command(after_help = "Example: evidence status")]
    Status,

    /// Generate shell completions
    #[command(after_help = "Examples:
  evidence completions bash > ~/.bash_completion.d/evidence
  evidence completions zsh > ~/.zfunc/_evidence
  evidence completions fish > ~/.config/fish/completions/evidence.fish")]
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        ui::print_error(&err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = envy::prefixed("EVIDENCE_").from_env::<Config>()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            content,
            evidence_type,
            digest,
            json,
            contract_address,
            tx_hash,
            to,
            admin_pub,
        } => {
            let args = SubmitArgs {
                content,
                evidence_type,
                digest,
                json,
                contract_address,
                tx_hash,
                recipients: to,
                admin_pub,
            };
            commands::submit::run(&config, args).await
        }
        Commands::Fetch { digest, out } => {
            commands::fetch::run(&config, &digest, out.as_deref()).await
        }
        Commands::Decrypt { digest, file, key } => {
            let source = match (file, digest) {
                (Some(path), _) => Source::File(path),
                (None, Some(digest)) => Source::Digest(digest),
                (None, None) => anyhow::bail!("Pass a digest or --file"),
            };
            commands::decrypt::run(&config, source, key.as_deref()).await
        }
        Commands::Index { contract_address } => {
            commands::index::run(&config, contract_address).await
        }
        Commands::Register {
            tx_hash,
            digest,
            cid,
            contract_address,
            reporter_address,
        } => {
            let payload = RegisterDisputePayload {
                tx_hash: Some(tx_hash),
                digest: Some(digest),
                cid,
                contract_address,
                reporter_address,
            };
            commands::register::run(&config, payload).await
        }
        Commands::Keygen { json } => commands::keygen::run(json),
        Commands::Status => commands::status::run(&config).await,
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "evidence", &mut std::io::stdout());
            Ok(())
        }
    }
}
