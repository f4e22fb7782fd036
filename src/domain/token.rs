use std::collections::BTreeMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::FieldValue;

/// Prefix carried by every hex-wrapped token.
pub const HEX_PREFIX: &str = "0x";

/// The inner structure of a field token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub value: FieldValue,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub nonce: String,
}

/// Integrity proof attached to a set of encoded fields.
///
/// `hash` is the digest of the whole plaintext `data`; `fields` holds one
/// digest per encoded field so a single token can be checked without
/// revealing the others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityProof {
    pub data: serde_json::Value,
    pub timestamp: i64,
    pub hash: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl IntegrityProof {
    pub fn field_digest(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// True if `digest` matches the record digest or any field digest.
    pub fn contains_digest(&self, digest: &str) -> bool {
        self.hash == digest || self.fields.values().any(|d| d == digest)
    }
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("Cannot encode non-finite number: {0}")]
    NonFiniteNumber(f64),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Token is empty")]
    Empty,

    #[error("Token is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Token body is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Token body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Token payload has unexpected structure: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Reject values serde_json would silently turn into `null`.
pub fn ensure_finite(value: &FieldValue) -> Result<(), EncodingError> {
    match value {
        FieldValue::Number(n) if !n.is_finite() => Err(EncodingError::NonFiniteNumber(*n)),
        _ => Ok(()),
    }
}

pub fn wrap_hex(bytes: &[u8]) -> String {
    format!("{}{}", HEX_PREFIX, hex::encode(bytes))
}

/// Strip the optional `0x` prefix and decode the hex body.
pub fn unwrap_hex(token: &str) -> Result<Vec<u8>, DecodeError> {
    let body = token.trim();
    let body = body.strip_prefix(HEX_PREFIX).unwrap_or(body);
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(hex::decode(body)?)
}

/// `0x` + hex(base64(json(payload)))
pub fn encode_payload(payload: &TokenPayload) -> Result<String, EncodingError> {
    ensure_finite(&payload.value)?;
    let json = serde_json::to_vec(payload)?;
    let inner = STANDARD.encode(json);
    Ok(wrap_hex(inner.as_bytes()))
}

pub fn parse_payload(token: &str) -> Result<TokenPayload, DecodeError> {
    let bytes = unwrap_hex(token)?;
    let inner = String::from_utf8(bytes)?;
    let json = STANDARD.decode(inner.trim())?;
    Ok(serde_json::from_slice(&json)?)
}

/// `0x` + hex(json(proof))
pub fn encode_proof(proof: &IntegrityProof) -> Result<String, EncodingError> {
    let json = serde_json::to_vec(proof)?;
    Ok(wrap_hex(&json))
}

pub fn parse_proof(token: &str) -> Result<IntegrityProof, DecodeError> {
    let bytes = unwrap_hex(token)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Lowercase hex SHA-256 of the JSON serialization of `value`.
pub fn digest_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodingError> {
    let json = serde_json::to_vec(value)?;
    Ok(hex::encode(Sha256::digest(&json)))
}
