//! Generate a secp256k1 keypair for receiving evidence.

use anyhow::Result;
use serde_json::json;
use shared::keys::{GeneratedKeypair, generate_keypair};

use crate::ui;

pub fn render_json(pair: &GeneratedKeypair) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({
        "privateKey": pair.private_key,
        "publicKey": pair.public_key,
        "address": pair.address,
    }))?)
}

pub fn run(as_json: bool) -> Result<()> {
    let pair = generate_keypair();

    if as_json {
        println!("{}", render_json(&pair)?);
        return Ok(());
    }

    println!("{}", ui::field("Address", &ui::bold(&pair.address)));
    println!("{}", ui::field("Public key", &pair.public_key));
    println!("{}", ui::field("Private key", &pair.private_key));
    ui::info("Share the public key. Keep the private key secret; export it as EVIDENCE_PRIVATE_KEY to decrypt.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::keys::{address_from_public_key_hex, parse_private_key, public_key_hex};

    #[test]
    fn json_output_is_consistent() {
        let pair = generate_keypair();
        let parsed: serde_json::Value = serde_json::from_str(&render_json(&pair).unwrap()).unwrap();

        let secret = parse_private_key(parsed["privateKey"].as_str().unwrap()).unwrap();
        let public_key = parsed["publicKey"].as_str().unwrap();

        assert_eq!(public_key_hex(&secret), public_key);
        assert_eq!(
            address_from_public_key_hex(public_key).unwrap(),
            parsed["address"].as_str().unwrap()
        );
    }
}
