//! Command-line and environment configuration.
//!
//! [`AuthConfig`] is assembled in three layers: built-in defaults, then an
//! optional JSON file, then individual flags (each also readable from an
//! `HCS_AUTH_*` environment variable).

use std::path::{Path, PathBuf};

use clap::Args;
use eyre::WrapErr as _;
use hcs_auth_core::{AuthConfig, Keyring, SharedSecret};
use zeroize::Zeroizing;

/// Source of the HCS code.
#[derive(Args)]
pub struct CodeArgs {
    /// Full HCS code shared with the mission planner.
    #[arg(long = "hcs-code", env = "HCS_AUTH_CODE", hide_env_values = true)]
    hcs_code: String,
}

impl std::fmt::Debug for CodeArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeArgs")
            .field("hcs_code", &"[REDACTED]")
            .finish()
    }
}

impl CodeArgs {
    /// Builds the [`SharedSecret`] for the configured code.
    pub fn secret(&self) -> eyre::Result<SharedSecret> {
        let code = Zeroizing::new(self.hcs_code.clone());
        SharedSecret::new(code.as_str()).wrap_err("invalid HCS code")
    }

    pub fn keyring(&self) -> eyre::Result<Keyring> {
        Ok(Keyring::from(self.secret()?))
    }
}

/// Engine tunables.
#[derive(Debug, Default, Args)]
pub struct AuthArgs {
    /// JSON file with camelCase `AuthConfig` keys.
    #[arg(long, env = "HCS_AUTH_CONFIG")]
    config: Option<PathBuf>,

    /// Validity window for payloads without an `expiration`.
    #[arg(long, env = "HCS_AUTH_DEFAULT_EXPIRATION_SECONDS")]
    default_expiration_seconds: Option<u64>,

    /// Upper bound on any payload's validity window.
    #[arg(long, env = "HCS_AUTH_MAX_EXPIRATION_SECONDS")]
    max_expiration_seconds: Option<u64>,

    /// Seconds scanning stays disabled after a success.
    #[arg(long, env = "HCS_AUTH_COOLDOWN_SECONDS")]
    cooldown_seconds: Option<u64>,

    /// Longest scan string accepted, in bytes.
    #[arg(long, env = "HCS_AUTH_MAX_PAYLOAD_BYTES")]
    max_payload_bytes: Option<u32>,

    /// Interval between reader polls in `listen`.
    #[arg(long, env = "HCS_AUTH_POLL_INTERVAL_SECONDS")]
    poll_interval_seconds: Option<f64>,

    /// Burn a token after this many failed verifications.
    #[arg(long, env = "HCS_AUTH_MAX_FAILED_ATTEMPTS")]
    max_failed_attempts: Option<u32>,
}

impl AuthArgs {
    pub fn resolve(&self) -> eyre::Result<AuthConfig> {
        let base = match &self.config {
            Some(path) => load_file(path)?,
            None => AuthConfig::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(&self, mut config: AuthConfig) -> AuthConfig {
        if let Some(value) = self.default_expiration_seconds {
            config.default_expiration_seconds = value;
        }
        if let Some(value) = self.max_expiration_seconds {
            config.max_expiration_seconds = value;
        }
        if let Some(value) = self.cooldown_seconds {
            config.cooldown_seconds = value;
        }
        if let Some(value) = self.max_payload_bytes {
            config.max_payload_bytes = value;
        }
        if let Some(value) = self.poll_interval_seconds {
            config.poll_interval_seconds = value;
        }
        if self.max_failed_attempts.is_some() {
            config.max_failed_attempts_per_token = self.max_failed_attempts;
        }
        config
    }
}

fn load_file(path: &Path) -> eyre::Result<AuthConfig> {
    let raw = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse config file {}", path.display()))
}
