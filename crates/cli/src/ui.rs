//! Terminal UI helpers for consistent colored output.

use std::future::Future;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

/// Print a success message with green checkmark.
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an info message with blue info icon.
pub fn info(msg: &str) {
    eprintln!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning with a yellow marker.
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an error message with red X.
fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a hint/suggestion (dimmed, indented).
fn hint(msg: &str) {
    eprintln!("  {} {}", "→".dimmed(), msg.dimmed());
}

/// Format a value as bold (for digests, addresses, etc.).
pub fn bold(s: &str) -> String {
    s.bold().to_string()
}

/// Format a labelled value, label dimmed.
pub fn field(label: &str, value: &str) -> String {
    format!("{} {}", format!("{label}:").dimmed(), value)
}

/// Shorten a long hex value for tables: `0x1234…abcd`.
pub fn short_hex(value: &str) -> String {
    if value.len() <= 14 {
        return value.to_string();
    }
    format!("{}…{}", &value[..6], &value[value.len() - 4..])
}

/// Run an async operation with a spinner showing the given message.
/// Returns the result of the operation.
pub async fn spin<T, F: Future<Output = T>>(msg: &str, fut: F) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.dim} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let result = fut.await;

    spinner.finish_and_clear();
    result
}

/// Display an error with contextual hints based on the error message.
pub fn print_error(err: &anyhow::Error) {
    let msg = err.to_string();
    error(&msg);

    if let Some(hint_text) = hint_for(&msg) {
        hint(hint_text);
    }
}

fn hint_for(msg: &str) -> Option<&'static str> {
    // More specific checks first
    if msg.contains("No private key") {
        None
    } else if msg.contains("Decryption failed") {
        Some("This key is not a recipient of the evidence, or the envelope was altered.")
    } else if msg.contains("invalid private key") {
        Some("Private keys are 32 bytes of hex, with or without 0x. Run: evidence keygen")
    } else if msg.contains("not configured") {
        Some("The server has no admin key. Set EVIDENCE_ADMIN_PUBLIC_KEY on the server.")
    } else if msg.contains("not found") || msg.contains("Not Found") {
        Some("Check the digest. Evidence is looked up by the digest it was submitted with.")
    } else if msg.contains("invalid recipient public key") {
        Some("Public keys are secp256k1 hex: 04-prefixed uncompressed, compressed, or raw X‖Y.")
    } else if msg.contains("connection")
        || msg.contains("Connection")
        || msg.contains("dns")
        || msg.contains("timeout")
        || msg.contains("Timeout")
        || msg.contains("error sending request")
    {
        Some("Is the evidence endpoint running? Set EVIDENCE_API_URL to point at it.")
    } else {
        None
    }
}
