//! Status events published on the status channel.

use serde::Serialize;
use strum::{Display, EnumString};

/// Authentication status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum AuthStatus {
    /// Idle and accepting scans.
    Ready,
    /// A candidate payload is being verified.
    Processing,
    /// The payload authenticated and its mission was released.
    Success,
    /// The payload's validity window has passed.
    Expired,
    /// The payload's token was already consumed.
    Replay,
    /// The payload's signature did not verify.
    Invalid,
    /// The payload could not be decoded or decrypted.
    Error,
}

impl AuthStatus {
    /// Whether this status ends an attempt.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Ready | Self::Processing)
    }
}

/// One record on the status channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct AuthEvent {
    /// Status tag.
    pub status: AuthStatus,
    /// Human-readable description.
    pub message: String,
    /// Wall-clock time of the event, in fractional seconds since the Unix epoch.
    pub timestamp: f64,
}

impl AuthEvent {
    pub(crate) fn new(status: AuthStatus, message: impl Into<String>, timestamp: f64) -> Self {
        Self {
            status,
            message: message.into(),
            timestamp,
        }
    }
}
