//! Error types for the authentication pipeline.

use thiserror::Error;

use crate::event::AuthStatus;

/// Result type for pipeline stages.
pub type AuthResult<T> = Result<T, AuthError>;

/// Reasons an authentication attempt is rejected.
///
/// Every stage of the pipeline reports through this type. The engine turns
/// each variant into exactly one terminal [`AuthStatus`]; nothing here ever
/// escapes the engine boundary as a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "ffi", derive(uniffi::Error))]
#[cfg_attr(feature = "ffi", uniffi(flat_error))]
pub enum AuthError {
    /// The scanned text is not a well-formed, complete payload.
    #[error("decode error: {0}")]
    Decode(String),

    /// The payload's validity window has passed.
    #[error("payload expired at {expired_at}")]
    Expired {
        /// Unix second after which the payload stopped being accepted.
        expired_at: i64,
    },

    /// The payload's token has already been consumed.
    #[error("token already consumed")]
    Replay,

    /// The authenticity tag did not verify, or no secret matched the payload.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Authenticated decryption failed or the plaintext is not a mission.
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Unexpected failure unrelated to the presented payload.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    pub(crate) fn integrity(reason: impl Into<String>) -> Self {
        Self::Integrity(reason.into())
    }

    pub(crate) fn decryption(reason: impl Into<String>) -> Self {
        Self::Decryption(reason.into())
    }

    pub(crate) fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }

    /// Terminal status reported for this failure.
    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        match self {
            Self::Decode(_) | Self::Decryption(_) | Self::Internal(_) => AuthStatus::Error,
            Self::Expired { .. } => AuthStatus::Expired,
            Self::Replay => AuthStatus::Replay,
            Self::Integrity(_) => AuthStatus::Invalid,
        }
    }

    /// Human-readable message published on the status channel.
    ///
    /// Coarse on purpose; the detailed reason only goes to the log.
    #[must_use]
    pub const fn status_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Invalid QR format",
            Self::Expired { .. } => "QR code expired",
            Self::Replay => "Token already consumed",
            Self::Integrity(_) => "Invalid signature",
            Self::Decryption(_) => "Decryption failed",
            Self::Internal(_) => "Internal error",
        }
    }

    /// Whether the failure indicates a possible attack rather than a bad scan.
    #[must_use]
    pub const fn is_security_relevant(&self) -> bool {
        matches!(self, Self::Replay | Self::Integrity(_))
    }

    /// Whether this failure counts against a token's failed-attempt budget.
    pub(crate) const fn counts_as_failed_attempt(&self) -> bool {
        matches!(self, Self::Integrity(_) | Self::Decryption(_))
    }
}
