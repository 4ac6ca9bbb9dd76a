//! Engine configuration injected by the surrounding harness.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Validity window applied when a payload omits `expiration`.
pub const DEFAULT_EXPIRATION_SECONDS: u64 = 30 * 60;

/// Upper bound on any payload's validity window.
pub const DEFAULT_MAX_EXPIRATION_SECONDS: u64 = 24 * 60 * 60;

/// Time scanning stays disabled after a successful authentication.
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 5;

/// Largest scanned string the decoder will look at.
pub const DEFAULT_MAX_PAYLOAD_BYTES: u32 = 8192;

/// Reference rate at which the harness polls the code reader (10 Hz).
pub const DEFAULT_POLL_INTERVAL_SECONDS: f64 = 0.1;

/// Tunables for [`AuthenticationEngine`](crate::AuthenticationEngine).
///
/// Deserializes from camelCase keys; any key left out takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct AuthConfig {
    /// Validity window used when a payload's `expiration` is absent or non-positive.
    pub default_expiration_seconds: u64,
    /// Clamp on the validity window.
    ///
    /// `expiration` is not covered by the signature, so this bound (not the
    /// payload) decides how long consumed tokens must be remembered.
    pub max_expiration_seconds: u64,
    /// Duration of the post-success burn window.
    pub cooldown_seconds: u64,
    /// Maximum length of a scanned string, checked before decoding.
    pub max_payload_bytes: u32,
    /// Interval between polls of the code reader. Only the harness reads this.
    pub poll_interval_seconds: f64,
    /// Burn a token after this many integrity or decryption failures.
    ///
    /// `None` keeps failed tokens retryable indefinitely.
    pub max_failed_attempts_per_token: Option<u32>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_expiration_seconds: DEFAULT_EXPIRATION_SECONDS,
            max_expiration_seconds: DEFAULT_MAX_EXPIRATION_SECONDS,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            max_failed_attempts_per_token: None,
        }
    }
}

impl AuthConfig {
    /// Cooldown as a [`Duration`].
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_seconds)
    }

    /// Poll interval as a [`Duration`].
    ///
    /// Falls back to the 10 Hz reference rate when the configured value is
    /// zero, negative or not a number.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.poll_interval_seconds)
            .ok()
            .filter(|interval| !interval.is_zero())
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_POLL_INTERVAL_SECONDS))
    }

    /// Maximum scanned string length in bytes.
    #[must_use]
    pub fn max_payload_len(&self) -> usize {
        usize::try_from(self.max_payload_bytes).unwrap_or(usize::MAX)
    }
}
