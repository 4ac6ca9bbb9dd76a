//! Pre-provisioned HCS codes and their lookup by fingerprint.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::error::{AuthError, AuthResult};

/// Length of the public fingerprint carried in a payload's `hcsCode` field.
pub const FINGERPRINT_LEN: usize = 16;

/// An HCS code shared between the issuer and this device.
///
/// The code keys the payload HMAC and seeds mission key derivation. Payloads
/// only ever carry its [fingerprint](Self::fingerprint).
pub struct SharedSecret {
    code: SecretString,
    fingerprint: String,
}

impl SharedSecret {
    /// Wraps a provisioned HCS code.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Integrity`] if the code is empty.
    pub fn new(code: impl Into<String>) -> AuthResult<Self> {
        let code: String = code.into();
        if code.is_empty() {
            return Err(AuthError::integrity("HCS code must not be empty"));
        }
        let fingerprint = fingerprint(&code);
        Ok(Self {
            code: SecretString::from(code),
            fingerprint,
        })
    }

    /// Public identifier of this code: the first 16 characters of
    /// `base64(SHA-256(code))`.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Raw code bytes. Treat as sensitive material.
    pub(crate) fn expose(&self) -> &str {
        self.code.expose_secret()
    }

    fn matches(&self, presented: &str) -> bool {
        self.fingerprint
            .as_bytes()
            .ct_eq(presented.as_bytes())
            .into()
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecret")
            .field("code", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Computes the public fingerprint of an HCS code.
#[must_use]
pub fn fingerprint(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    let mut encoded = STANDARD.encode(digest);
    encoded.truncate(FINGERPRINT_LEN);
    encoded
}

/// The set of HCS codes provisioned on this device.
#[derive(Debug, Default)]
pub struct Keyring {
    secrets: Vec<SharedSecret>,
}

impl Keyring {
    /// Creates an empty keyring.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            secrets: Vec::new(),
        }
    }

    /// Adds a code; a code with the same fingerprint replaces the old one.
    pub fn insert(&mut self, secret: SharedSecret) {
        self.secrets
            .retain(|existing| existing.fingerprint != secret.fingerprint);
        self.secrets.push(secret);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with_secret(mut self, secret: SharedSecret) -> Self {
        self.insert(secret);
        self
    }

    /// Number of provisioned codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether no code is provisioned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Finds the code whose fingerprint equals `presented`.
    ///
    /// Every entry is compared so lookup time does not depend on which one
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Integrity`] when the keyring is empty or no code
    /// matches.
    pub fn resolve(&self, presented: &str) -> AuthResult<&SharedSecret> {
        if self.secrets.is_empty() {
            return Err(AuthError::integrity("no HCS code provisioned"));
        }
        let mut found = None;
        for secret in &self.secrets {
            if secret.matches(presented) && found.is_none() {
                found = Some(secret);
            }
        }
        found.ok_or_else(|| AuthError::integrity("no provisioned HCS code matches payload"))
    }
}

impl From<SharedSecret> for Keyring {
    fn from(secret: SharedSecret) -> Self {
        Self::new().with_secret(secret)
    }
}
