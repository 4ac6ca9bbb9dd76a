//! Issuer side of the protocol: encrypts a mission and signs the payload.
//!
//! This is what the mission planner runs before rendering the QR code. The
//! device never needs it at runtime; it backs the `issue` CLI command and the
//! end-to-end tests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::cipher::{derive_key, seal, NONCE_LEN};
use crate::config::DEFAULT_EXPIRATION_SECONDS;
use crate::error::{AuthError, AuthResult};
use crate::integrity::sign;
use crate::mission::MissionPlaintext;
use crate::payload::RawPayload;
use crate::secret::SharedSecret;

/// Payload format version emitted by this issuer.
pub const PAYLOAD_VERSION: &str = "1.0";

/// Length of a generated token in random bytes (hex-encoded on the wire).
pub const TOKEN_BYTES: usize = 16;

/// Explicit per-payload parameters, for reproducible payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueParams {
    /// Issue time, seconds since the Unix epoch.
    pub timestamp: i64,
    /// Single-use token.
    pub token: String,
    /// AES-GCM nonce.
    pub nonce: [u8; NONCE_LEN],
}

impl IssueParams {
    /// Fresh random token and nonce for a payload issued at `timestamp`.
    #[must_use]
    pub fn random(timestamp: i64) -> Self {
        let mut token = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut token);
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        Self {
            timestamp,
            token: hex::encode(token),
            nonce,
        }
    }
}

/// Produces signed, encrypted mission payloads under one HCS code.
#[derive(Debug)]
pub struct MissionIssuer {
    secret: SharedSecret,
    expiration: i64,
}

impl MissionIssuer {
    /// Creates an issuer with the default 30 minute validity window.
    #[must_use]
    pub fn new(secret: SharedSecret) -> Self {
        Self {
            secret,
            expiration: i64::try_from(DEFAULT_EXPIRATION_SECONDS).unwrap_or(i64::MAX),
        }
    }

    /// Overrides the validity window written into payloads.
    #[must_use]
    pub const fn with_expiration(mut self, seconds: i64) -> Self {
        self.expiration = seconds;
        self
    }

    /// Fingerprint written into every payload's `hcsCode` field.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.secret.fingerprint()
    }

    /// Issues a payload with a random token and nonce.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if serialization or encryption fails.
    pub fn issue(&self, mission: &MissionPlaintext, timestamp: i64) -> AuthResult<RawPayload> {
        self.issue_with(mission, IssueParams::random(timestamp))
    }

    /// Issues a payload with caller-chosen token and nonce.
    ///
    /// Reusing a nonce under the same timestamp reuses the AES-GCM key/nonce
    /// pair; only do this for fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if serialization or encryption fails.
    pub fn issue_with(&self, mission: &MissionPlaintext, params: IssueParams) -> AuthResult<RawPayload> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(mission)
                .map_err(|err| AuthError::internal(format!("mission serialization: {err}")))?,
        );
        let key = derive_key(&self.secret, params.timestamp)?;
        let sealed = seal(&key, &params.nonce, &plaintext)?;

        let mut payload = RawPayload {
            version: Some(PAYLOAD_VERSION.to_string()),
            encrypted: STANDARD.encode(sealed),
            timestamp: params.timestamp,
            expiration: Some(self.expiration),
            token: params.token,
            hcs_code: self.secret.fingerprint().to_string(),
            hmac: String::new(),
        };
        payload.hmac = sign(&self.secret, &payload)?;
        Ok(payload)
    }
}
