//! Canonical JSON and keccak256 content digests.
//!
//! Evidence is hashed over a deterministic serialization so that the same
//! logical content always yields the same digest, regardless of the key
//! order the submitter happened to use.
//!
//! Object keys are sorted by UTF-16 code units. That is the order JavaScript's
//! default `sort()` produces, so digests match the ones computed by the web
//! frontend and the on-chain tooling. Numbers are written the way
//! `JSON.stringify` writes them: `1.0` is `1`, `-0` is `0`, and exponents
//! follow ECMAScript `Number::toString`.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tiny_keccak::{Hasher, Keccak};

/// The evidence payload handed to the producer.
///
/// Text is used verbatim; JSON is canonicalized first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Text(String),
    Json(Value),
}

impl Payload {
    /// The exact string that gets encrypted and hashed.
    pub fn canonical(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Json(value) => canonicalize(value),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Payload::Text(text),
            other => Payload::Json(other),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

/// Serializes a JSON value with recursively sorted object keys and no whitespace.
pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| utf16_cmp(a, b));

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Number(number) => write_number(number, out),
        scalar => out.push_str(&scalar.to_string()),
    }
}

// JavaScript holds every number as an f64, so integers past 2^53 round the
// same way here.
fn write_number(number: &Number, out: &mut String) {
    match number.as_f64() {
        Some(n) if n == 0.0 => out.push('0'),
        Some(n) if n.is_finite() => out.push_str(ryu_js::Buffer::new().format_finite(n)),
        _ => out.push_str(&number.to_string()),
    }
}

fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

/// keccak256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// keccak256 rendered the way ethers does: `0x` + 64 lowercase hex chars.
pub fn keccak256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(data)))
}

/// Digest of the canonical plaintext, used for on-chain consistency checks.
pub fn content_digest(payload: &Payload) -> String {
    keccak256_hex(payload.canonical().as_bytes())
}
