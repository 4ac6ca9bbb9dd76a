//! Foreign-language surface for flight software written outside Rust.

use std::sync::Arc;

use crate::config::AuthConfig;
use crate::engine::AuthenticationEngine;
use crate::error::AuthError;
use crate::event::{AuthEvent, AuthStatus};
use crate::secret::{Keyring, SharedSecret};

/// Result of one processed scan, flattened for foreign callers.
#[derive(Debug, Clone, uniffi::Record)]
pub struct AttemptReport {
    /// Status events in publication order.
    pub events: Vec<AuthEvent>,
    /// Terminal status.
    pub status: AuthStatus,
    /// Mission-channel JSON record, present on success only.
    pub mission_json: Option<String>,
}

/// Wall-clock engine with a single provisioned HCS code.
#[derive(Debug, uniffi::Object)]
pub struct MissionAuthenticator {
    engine: AuthenticationEngine,
}

#[uniffi::export]
impl MissionAuthenticator {
    /// Creates an authenticator for `hcs_code`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Integrity`] if `hcs_code` is empty.
    #[uniffi::constructor]
    pub fn new(hcs_code: String, config: AuthConfig) -> Result<Arc<Self>, AuthError> {
        let keyring = Keyring::from(SharedSecret::new(hcs_code)?);
        Ok(Arc::new(Self {
            engine: AuthenticationEngine::with_system_clock(config, keyring),
        }))
    }

    /// See [`AuthenticationEngine::poll`].
    #[must_use]
    pub fn poll(&self) -> Option<AuthEvent> {
        self.engine.poll()
    }

    /// See [`AuthenticationEngine::attempt`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the mission record cannot be
    /// serialized.
    pub fn attempt(&self, candidate: &str) -> Result<Option<AttemptReport>, AuthError> {
        let Some(outcome) = self.engine.attempt(candidate) else {
            return Ok(None);
        };
        let events = outcome.events().cloned().collect();
        let status = outcome.status();
        let mission_json = outcome
            .mission
            .map(|mission| serde_json::to_string(&mission.into_record()))
            .transpose()
            .map_err(|err| AuthError::internal(format!("mission serialization: {err}")))?;
        Ok(Some(AttemptReport {
            events,
            status,
            mission_json,
        }))
    }
}
