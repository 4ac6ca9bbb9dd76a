//! Scanned payload decoding.
//!
//! The outer wire format is `base64(UTF-8 JSON object)`:
//!
//! ```text
//! {"version":"1.0","encrypted":"<b64 nonce||ct||tag>","timestamp":1700000000,
//!  "expiration":1800,"token":"<hex>","hcsCode":"<fingerprint>","hmac":"<b64 tag>"}
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Untrusted payload extracted from a scanned string.
///
/// Only [`decode`] produces values from scanned input, and it never returns
/// a payload with a required field missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPayload {
    /// Issuer format version; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Base64 of `nonce || ciphertext || tag`.
    pub encrypted: String,
    /// Issue time, seconds since the Unix epoch.
    pub timestamp: i64,
    /// Validity window length in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<i64>,
    /// Single-use token identifying this payload instance.
    pub token: String,
    /// Fingerprint of the HCS code the payload was issued under.
    pub hcs_code: String,
    /// Authenticity tag over the canonical signed fields.
    pub hmac: String,
}

impl RawPayload {
    fn ensure_complete(&self) -> AuthResult<()> {
        let required = [
            ("encrypted", &self.encrypted),
            ("token", &self.token),
            ("hcsCode", &self.hcs_code),
            ("hmac", &self.hmac),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(AuthError::decode(format!("field `{field}` is empty")));
            }
        }
        Ok(())
    }

    /// Encodes the payload in the scanned-string wire format.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if JSON serialization fails.
    pub fn to_qr_string(&self) -> AuthResult<String> {
        let json = serde_json::to_vec(self)
            .map_err(|err| AuthError::internal(format!("payload serialization: {err}")))?;
        Ok(STANDARD.encode(json))
    }
}

/// Decodes a scanned string into a [`RawPayload`].
///
/// Inputs longer than `max_payload_len` bytes are rejected before any
/// decoding work is done.
///
/// # Errors
///
/// Returns [`AuthError::Decode`] if the input is oversized, not standard
/// base64, not UTF-8, not a JSON object, or lacks a required field.
pub fn decode(candidate: &str, max_payload_len: usize) -> AuthResult<RawPayload> {
    if candidate.len() > max_payload_len {
        return Err(AuthError::decode(format!(
            "payload of {} bytes exceeds limit of {max_payload_len}",
            candidate.len()
        )));
    }
    let bytes = STANDARD
        .decode(candidate)
        .map_err(|err| AuthError::decode(format!("invalid base64: {err}")))?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|err| AuthError::decode(format!("invalid UTF-8: {err}")))?;
    let payload: RawPayload = serde_json::from_str(text)
        .map_err(|err| AuthError::decode(format!("invalid payload JSON: {err}")))?;
    payload.ensure_complete()?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const LIMIT: usize = 8192;

    fn wrap(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn test_decode_complete_payload() {
        let qr = wrap(
            r#"{"version":"1.0","encrypted":"AAAA","timestamp":1700000000,"expiration":600,"token":"ab12","hcsCode":"fp","hmac":"tag"}"#,
        );
        let payload = decode(&qr, LIMIT).expect("decode");
        assert_eq!(payload.encrypted, "AAAA");
        assert_eq!(payload.timestamp, 1_700_000_000);
        assert_eq!(payload.expiration, Some(600));
        assert_eq!(payload.token, "ab12");
        assert_eq!(payload.hcs_code, "fp");
        assert_eq!(payload.hmac, "tag");
        assert_eq!(payload.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_expiration_is_optional() {
        let qr = wrap(r#"{"encrypted":"AAAA","timestamp":1,"token":"t","hcsCode":"fp","hmac":"tag"}"#);
        let payload = decode(&qr, LIMIT).expect("decode");
        assert_eq!(payload.expiration, None);
        assert_eq!(payload.version, None);
    }

    #[test_case("not base64!!" ; "non base64 text")]
    #[test_case("eyJlbmNyeXB0ZWQiOi" ; "truncated base64")]
    #[test_case("aGVsbG8gd29ybGQ=" ; "base64 of plain text")]
    #[test_case("WzEsMiwzXQ==" ; "base64 of json array")]
    #[test_case("//79" ; "base64 of invalid utf8")]
    #[test_case("" ; "empty input")]
    fn test_malformed_input_is_decode_error(candidate: &str) {
        assert!(matches!(decode(candidate, LIMIT), Err(AuthError::Decode(_))));
    }

    #[test_case("encrypted")]
    #[test_case("timestamp")]
    #[test_case("token")]
    #[test_case("hcsCode")]
    #[test_case("hmac")]
    fn test_missing_required_field(field: &str) {
        let mut object = serde_json::json!({
            "encrypted": "AAAA",
            "timestamp": 1,
            "token": "t",
            "hcsCode": "fp",
            "hmac": "tag",
        });
        object
            .as_object_mut()
            .expect("object")
            .remove(field);
        let qr = wrap(&object.to_string());
        assert!(matches!(decode(&qr, LIMIT), Err(AuthError::Decode(_))));
    }

    #[test]
    fn test_empty_required_field() {
        let qr = wrap(r#"{"encrypted":"AAAA","timestamp":1,"token":"","hcsCode":"fp","hmac":"tag"}"#);
        assert!(matches!(decode(&qr, LIMIT), Err(AuthError::Decode(_))));
    }

    #[test]
    fn test_mistyped_timestamp() {
        let qr = wrap(r#"{"encrypted":"AAAA","timestamp":"soon","token":"t","hcsCode":"fp","hmac":"tag"}"#);
        assert!(matches!(decode(&qr, LIMIT), Err(AuthError::Decode(_))));
    }

    #[test]
    fn test_oversized_input_rejected_before_decoding() {
        // Not valid base64 either; the size check must fire first.
        let candidate = "!".repeat(65);
        match decode(&candidate, 64) {
            Err(AuthError::Decode(reason)) => assert!(reason.contains("exceeds limit")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_qr_string_round_trip() {
        let payload = RawPayload {
            version: Some("1.0".to_string()),
            encrypted: "AAAA".to_string(),
            timestamp: 5,
            expiration: None,
            token: "t".to_string(),
            hcs_code: "fp".to_string(),
            hmac: "tag".to_string(),
        };
        let qr = payload.to_qr_string().expect("encode");
        assert_eq!(decode(&qr, LIMIT).expect("decode"), payload);
    }
}
