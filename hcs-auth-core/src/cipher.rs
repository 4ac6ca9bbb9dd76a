//! Mission key derivation and AES-256-GCM payload encryption.
//!
//! ```text
//! key       = HKDF-SHA256(ikm = "<hcs code>:<timestamp>", salt = "HCS-MISSION-KEY",
//!                         info = "AES-256-GCM", len = 32)
//! encrypted = nonce (12) || ciphertext || tag (16)
//! ```
//!
//! No associated data is bound into the AEAD.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{AuthError, AuthResult};
use crate::mission::MissionPlaintext;
use crate::payload::RawPayload;
use crate::secret::SharedSecret;

/// HKDF salt, a fixed domain string.
pub const HKDF_SALT: &[u8] = b"HCS-MISSION-KEY";

/// HKDF info, naming the AEAD the key is for.
pub const HKDF_INFO: &[u8] = b"AES-256-GCM";

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// Derived key length.
pub const KEY_LEN: usize = 32;

/// AES-GCM authentication tag length.
pub const AEAD_TAG_LEN: usize = 16;

/// Per-payload AES-256 key.
///
/// Bound to both the HCS code and the payload's timestamp, so a key recovered
/// for one payload opens no payload with a different timestamp. Zeroized on
/// drop; never persisted.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    /// Returns the raw key bytes. Treat as sensitive material.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derives the mission key for a payload issued at `timestamp`.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if HKDF expansion fails.
pub fn derive_key(secret: &SharedSecret, timestamp: i64) -> AuthResult<DerivedKey> {
    let ikm = Zeroizing::new(format!("{}:{timestamp}", secret.expose()));
    let hkdf = Hkdf::<Sha256>::new(Some(HKDF_SALT), ikm.as_bytes());
    let mut key = [0u8; KEY_LEN];
    hkdf.expand(HKDF_INFO, &mut key)
        .map_err(|_| AuthError::internal("HKDF expansion failed"))?;
    Ok(DerivedKey(key))
}

/// Seals `plaintext` under `key`, returning `nonce || ciphertext || tag`.
///
/// # Errors
///
/// Returns [`AuthError::Internal`] if encryption fails.
pub fn seal(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> AuthResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: &[],
            },
        )
        .map_err(|_| AuthError::internal("AES-256-GCM encryption failed"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Opens a `nonce || ciphertext || tag` blob under `key`.
///
/// Never returns partial plaintext.
///
/// # Errors
///
/// Returns [`AuthError::Decryption`] if the blob is shorter than a nonce or
/// authentication fails.
pub fn open(key: &DerivedKey, sealed: &[u8]) -> AuthResult<Zeroizing<Vec<u8>>> {
    if sealed.len() < NONCE_LEN {
        return Err(AuthError::decryption(format!(
            "encrypted blob too short: expected at least {NONCE_LEN} bytes, got {}",
            sealed.len()
        )));
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(key.as_bytes().into());
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: &[],
            },
        )
        .map_err(|_| AuthError::decryption("AES-256-GCM authentication failed"))?;
    Ok(Zeroizing::new(plaintext))
}

/// Decrypts a verified payload's mission.
///
/// # Errors
///
/// Returns [`AuthError::Decryption`] if `encrypted` is not base64, fails to
/// authenticate, or does not hold a mission-shaped JSON object.
pub fn decrypt_mission(secret: &SharedSecret, payload: &RawPayload) -> AuthResult<MissionPlaintext> {
    let sealed = STANDARD
        .decode(&payload.encrypted)
        .map_err(|err| AuthError::decryption(format!("encrypted field is not base64: {err}")))?;
    let key = derive_key(secret, payload.timestamp)?;
    let plaintext = open(&key, &sealed)?;
    serde_json::from_slice(&plaintext)
        .map_err(|err| AuthError::decryption(format!("plaintext is not a mission: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "F82C7S45CrA1";
    const NONCE: [u8; NONCE_LEN] = [7u8; NONCE_LEN];

    fn secret() -> SharedSecret {
        SharedSecret::new(CODE).expect("secret")
    }

    #[test]
    fn test_key_matches_reference_derivation() {
        // Same construction, spelled out with the hkdf crate directly.
        let hkdf = Hkdf::<Sha256>::new(Some(&b"HCS-MISSION-KEY"[..]), b"F82C7S45CrA1:1700000000");
        let mut expected = [0u8; 32];
        hkdf.expand(b"AES-256-GCM", &mut expected).expect("expand");

        let key = derive_key(&secret(), 1_700_000_000).expect("derive");
        assert_eq!(key.as_bytes(), &expected);
    }

    #[test]
    fn test_key_bound_to_timestamp_and_code() {
        let base = derive_key(&secret(), 1_700_000_000).expect("derive");
        let later = derive_key(&secret(), 1_700_000_001).expect("derive");
        let other = derive_key(&SharedSecret::new("other").expect("secret"), 1_700_000_000)
            .expect("derive");
        assert_ne!(base.as_bytes(), later.as_bytes());
        assert_ne!(base.as_bytes(), other.as_bytes());
    }

    #[test]
    fn test_seal_open_layout() {
        let key = derive_key(&secret(), 1).expect("derive");
        let sealed = seal(&key, &NONCE, b"{\"name\":\"x\"}").expect("seal");
        assert_eq!(&sealed[..NONCE_LEN], &NONCE);
        assert_eq!(sealed.len(), NONCE_LEN + 12 + AEAD_TAG_LEN);

        let plaintext = open(&key, &sealed).expect("open");
        assert_eq!(plaintext.as_slice(), b"{\"name\":\"x\"}");
    }

    #[test]
    fn test_every_single_bit_flip_is_rejected() {
        let key = derive_key(&secret(), 1).expect("derive");
        let sealed = seal(&key, &NONCE, b"{\"name\":\"Recon Alpha\"}").expect("seal");

        for byte in 0..sealed.len() {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered[byte] ^= 1 << bit;
                assert!(
                    matches!(open(&key, &tampered), Err(AuthError::Decryption(_))),
                    "flip of bit {bit} in byte {byte} was not detected"
                );
            }
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let key = derive_key(&secret(), 1).expect("derive");
        let wrong = derive_key(&secret(), 2).expect("derive");
        let sealed = seal(&key, &NONCE, b"{}").expect("seal");
        assert!(matches!(open(&wrong, &sealed), Err(AuthError::Decryption(_))));
    }

    #[test]
    fn test_truncated_blobs_rejected() {
        let key = derive_key(&secret(), 1).expect("derive");
        for len in [0, 1, NONCE_LEN - 1, NONCE_LEN, NONCE_LEN + AEAD_TAG_LEN - 1] {
            let blob = vec![0u8; len];
            assert!(matches!(open(&key, &blob), Err(AuthError::Decryption(_))));
        }
    }

    fn payload_with(encrypted: String, timestamp: i64) -> RawPayload {
        RawPayload {
            version: None,
            encrypted,
            timestamp,
            expiration: None,
            token: "t".to_string(),
            hcs_code: secret().fingerprint().to_string(),
            hmac: "unused".to_string(),
        }
    }

    #[test]
    fn test_decrypt_mission_parses_plaintext() {
        let key = derive_key(&secret(), 42).expect("derive");
        let sealed = seal(&key, &NONCE, br#"{"name":"Sweep","maxDuration":45}"#).expect("seal");
        let mission =
            decrypt_mission(&secret(), &payload_with(STANDARD.encode(sealed), 42)).expect("decrypt");
        assert_eq!(mission.name.as_deref(), Some("Sweep"));
        assert_eq!(mission.max_duration, Some(45));
    }

    #[test]
    fn test_decrypt_mission_rejects_non_mission_plaintext() {
        let key = derive_key(&secret(), 42).expect("derive");
        for plaintext in [&b"not json"[..], &b"[1,2]"[..], &br#"{"maxDuration":"long"}"#[..]] {
            let sealed = seal(&key, &NONCE, plaintext).expect("seal");
            assert!(matches!(
                decrypt_mission(&secret(), &payload_with(STANDARD.encode(sealed), 42)),
                Err(AuthError::Decryption(_))
            ));
        }
    }

    #[test]
    fn test_decrypt_mission_rejects_bad_base64() {
        assert!(matches!(
            decrypt_mission(&secret(), &payload_with("%%%".to_string(), 42)),
            Err(AuthError::Decryption(_))
        ));
    }

    #[test]
    fn test_decrypt_mission_with_mismatched_timestamp_fails() {
        let key = derive_key(&secret(), 42).expect("derive");
        let sealed = seal(&key, &NONCE, b"{}").expect("seal");
        assert!(matches!(
            decrypt_mission(&secret(), &payload_with(STANDARD.encode(sealed), 43)),
            Err(AuthError::Decryption(_))
        ));
    }
}
