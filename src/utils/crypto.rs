// Cryptographic utilities for signing session cookies and generating nonces

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Separates the encoded payload from its signature in a signed value
pub const SIGNATURE_SEPARATOR: char = '.';

/// Generate a cryptographically secure nonce of specified byte length
///
/// # Returns
///
/// A base64url-encoded string representing the specified bytes of random data
#[must_use]
pub fn generate_nonce(length: usize) -> String {
    let mut bytes = vec![0u8; length];
    rand::rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(&bytes)
}

/// Serialize `data` to JSON and sign it with HMAC-SHA256
///
/// The result has the form `base64url(json).base64url(mac)` and is safe to
/// place in a cookie value without further encoding.
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - The secret is rejected by the MAC implementation
pub fn sign_data<T: Serialize>(data: &T, secret: &[u8]) -> Result<String> {
    let json_data = serde_json::to_vec(data).context("Failed to serialize data")?;
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(json_data);
    let signature = hmac_sha256(payload.as_bytes(), secret)?;

    Ok(format!(
        "{payload}{SIGNATURE_SEPARATOR}{}",
        general_purpose::URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify a value produced by [`sign_data`] and deserialize its payload
///
/// # Errors
///
/// Returns an error if:
/// - The value is not in `payload.signature` form
/// - Base64 decoding fails
/// - The signature does not match
/// - Deserialization fails
pub fn verify_signed_data<T: DeserializeOwned>(signed_value: &str, secret: &[u8]) -> Result<T> {
    let (payload, signature) = signed_value
        .rsplit_once(SIGNATURE_SEPARATOR)
        .ok_or_else(|| anyhow!("Signed value is missing its signature"))?;

    let signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature)
        .context("Failed to decode signature")?;

    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|_| anyhow!("Invalid HMAC key length"))?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| anyhow!("Signature mismatch"))?;

    let json_data = general_purpose::URL_SAFE_NO_PAD
        .decode(payload)
        .context("Failed to decode payload")?;

    serde_json::from_slice(&json_data).context("Failed to deserialize signed payload")
}

/// Sign a message using HMAC-SHA256
///
/// # Errors
///
/// Returns an error if HMAC key initialization fails
fn hmac_sha256(message: &[u8], secret: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|_| anyhow!("Invalid HMAC key length"))?;
    mac.update(message);

    Ok(mac.finalize().into_bytes().to_vec())
}
