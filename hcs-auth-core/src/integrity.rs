//! Payload authenticity: HMAC-SHA256 over the canonical signed fields.
//!
//! The signed representation is the compact JSON object
//! `{"encrypted":…,"timestamp":…,"token":…}` in exactly that field order,
//! keyed with the UTF-8 bytes of the HCS code. `expiration`, `hcsCode` and
//! `version` are not covered.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};
use crate::payload::RawPayload;
use crate::secret::{Keyring, SharedSecret};

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag.
pub const TAG_LEN: usize = 32;

// Field order here is the wire order.
#[derive(Serialize)]
struct SignedFields<'a> {
    encrypted: &'a str,
    timestamp: i64,
    token: &'a str,
}

/// Builds the exact byte string covered by the payload HMAC.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if JSON serialization fails.
pub fn canonical_signed_data(payload: &RawPayload) -> AuthResult<Vec<u8>> {
    serde_json::to_vec(&SignedFields {
        encrypted: &payload.encrypted,
        timestamp: payload.timestamp,
        token: &payload.token,
    })
    .map_err(|err| AuthError::internal(format!("canonical serialization: {err}")))
}

fn compute_tag(secret: &SharedSecret, data: &[u8]) -> AuthResult<[u8; TAG_LEN]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.expose().as_bytes())
        .map_err(|_| AuthError::internal("HMAC key rejected"))?;
    mac.update(data);
    let out = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&out);
    Ok(tag)
}

/// Parses a presented tag. Base64 is what issuers emit; 64-character hex is
/// accepted as well.
fn decode_tag(presented: &str) -> AuthResult<[u8; TAG_LEN]> {
    let bytes = if presented.len() == TAG_LEN * 2 {
        hex::decode(presented).ok()
    } else {
        STANDARD.decode(presented).ok()
    }
    .ok_or_else(|| AuthError::integrity("authenticity tag is neither base64 nor hex"))?;

    <[u8; TAG_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        AuthError::integrity(format!(
            "authenticity tag length mismatch: expected {TAG_LEN}, got {}",
            bytes.len()
        ))
    })
}

/// Computes the base64 tag an issuer attaches to `payload`.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if the canonical form cannot be built.
pub fn sign(secret: &SharedSecret, payload: &RawPayload) -> AuthResult<String> {
    let data = canonical_signed_data(payload)?;
    Ok(STANDARD.encode(compute_tag(secret, &data)?))
}

/// Verifies `payload.hmac` and returns the secret it was issued under.
///
/// The secret is located by the payload's `hcsCode` fingerprint; the tag is
/// then recomputed over the canonical fields and compared in constant time.
///
/// # Errors
///
/// Returns [`AuthError::Integrity`] if no provisioned secret matches, the tag
/// cannot be parsed, or the tag does not verify.
pub fn verify<'k>(keyring: &'k Keyring, payload: &RawPayload) -> AuthResult<&'k SharedSecret> {
    let secret = keyring.resolve(&payload.hcs_code)?;
    let presented = decode_tag(&payload.hmac)?;
    let data = canonical_signed_data(payload)?;
    let expected = compute_tag(secret, &data)?;
    if expected.ct_eq(&presented).unwrap_u8() != 1 {
        return Err(AuthError::integrity("authenticity tag mismatch"));
    }
    Ok(secret)
}
