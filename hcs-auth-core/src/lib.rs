//! `hcs-auth-core` authenticates mission payloads scanned from QR codes on a
//! drone's companion computer.
//!
//! A payload is a base64 JSON envelope carrying an AES-256-GCM encrypted
//! mission, an HMAC-SHA256 tag keyed by the shared HCS code, a single-use
//! token and a validity window. [`AuthenticationEngine`] runs each scan
//! through decode, freshness, replay, integrity and decryption checks and
//! releases the mission only when all of them pass.
//!
//! ```rust
//! use hcs_auth_core::{AuthConfig, AuthStatus, AuthenticationEngine, Keyring, SharedSecret};
//!
//! # fn main() -> Result<(), hcs_auth_core::AuthError> {
//! let keyring = Keyring::from(SharedSecret::new("F82C7S45CrA1")?);
//! let engine = AuthenticationEngine::with_system_clock(AuthConfig::default(), keyring);
//!
//! assert_eq!(engine.poll().map(|event| event.status), Some(AuthStatus::Ready));
//! let outcome = engine.attempt("not a payload").expect("engine is ready");
//! assert_eq!(outcome.status(), AuthStatus::Error);
//! # Ok(())
//! # }
//! ```

pub mod cipher;
pub mod clock;
pub mod config;
pub mod engine;
pub mod guard;
pub mod integrity;
pub mod issuer;
pub mod logger;
pub mod mission;
pub mod payload;

mod error;
pub use error::*;

mod event;
pub use event::*;

mod secret;
pub use secret::*;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::AuthConfig;
pub use engine::{AttemptOutcome, AuthenticationEngine, EnginePhase};
pub use issuer::{IssueParams, MissionIssuer};
pub use mission::{DecryptedMission, MissionPlaintext, MissionRecord, Waypoint, WaypointPlaintext};
pub use payload::RawPayload;

#[cfg(feature = "ffi")]
mod ffi;
#[cfg(feature = "ffi")]
pub use ffi::*;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!("hcs_auth_core");
