//! Authentication state machine.
//!
//! ```text
//! READY ──attempt──▶ PROCESSING ──▶ SUCCESS ──▶ COOLDOWN ──(timer)──▶ READY
//!                               └─▶ EXPIRED | REPLAY | INVALID | ERROR ──▶ READY
//! ```
//!
//! The cooldown is a deadline compared against the injected clock on every
//! [`poll`](AuthenticationEngine::poll) and
//! [`attempt`](AuthenticationEngine::attempt); nothing runs on a timer.

use std::iter;
use std::sync::{Mutex, TryLockError};
use std::time::Duration;

use crate::cipher;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::event::{AuthEvent, AuthStatus};
use crate::guard::{self, ReplayGuard};
use crate::integrity;
use crate::mission::{self, DecryptedMission};
use crate::payload::{self, RawPayload};
use crate::secret::Keyring;

const READY_MESSAGE: &str = "Waiting for QR code";
const PROCESSING_MESSAGE: &str = "Verifying QR code";

/// Externally observable engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    /// Accepting scans.
    Ready,
    /// Running the pipeline on a scan.
    Processing,
    /// Ignoring scans after a success.
    Cooldown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Ready,
    Processing,
    Cooldown { until: Duration },
}

#[derive(Debug)]
struct EngineState {
    phase: Phase,
    ready_announced: bool,
    guard: ReplayGuard,
}

/// Everything produced by one accepted scan.
#[derive(Debug)]
pub struct AttemptOutcome {
    /// `READY`, when a cooldown ended since the last poll and was not yet announced.
    pub ready: Option<AuthEvent>,
    /// The `PROCESSING` event.
    pub processing: AuthEvent,
    /// The single terminal event.
    pub terminal: AuthEvent,
    /// The mission, present exactly when the terminal status is `SUCCESS`.
    pub mission: Option<DecryptedMission>,
    /// Why the attempt failed, when it did.
    pub failure: Option<AuthError>,
}

impl AttemptOutcome {
    /// Terminal status of the attempt.
    #[must_use]
    pub const fn status(&self) -> AuthStatus {
        self.terminal.status
    }

    /// Status events in publication order.
    pub fn events(&self) -> impl Iterator<Item = &AuthEvent> {
        self.ready
            .iter()
            .chain(iter::once(&self.processing))
            .chain(iter::once(&self.terminal))
    }
}

/// Verifies scanned payloads and releases their missions.
///
/// Owns the consumed-token state and the cooldown deadline. All state sits
/// behind one mutex; a scan arriving while another is being processed is
/// dropped rather than queued.
#[derive(Debug)]
pub struct AuthenticationEngine<C: Clock = SystemClock> {
    config: AuthConfig,
    keyring: Keyring,
    clock: C,
    state: Mutex<EngineState>,
}

impl AuthenticationEngine<SystemClock> {
    /// Creates an engine reading wall-clock time.
    #[must_use]
    pub fn with_system_clock(config: AuthConfig, keyring: Keyring) -> Self {
        Self::new(config, keyring, SystemClock)
    }
}

impl<C: Clock> AuthenticationEngine<C> {
    /// Creates an engine in the `READY` phase.
    #[must_use]
    pub fn new(config: AuthConfig, keyring: Keyring, clock: C) -> Self {
        if keyring.is_empty() {
            log::warn!("no HCS code provisioned; every payload will be rejected");
        }
        let guard = ReplayGuard::new(&config);
        Self {
            config,
            keyring,
            clock,
            state: Mutex::new(EngineState {
                phase: Phase::Ready,
                ready_announced: false,
                guard,
            }),
        }
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Advances timer-driven transitions.
    ///
    /// Returns a `READY` event the first time it is called and whenever a
    /// cooldown has ended since the previous call.
    pub fn poll(&self) -> Option<AuthEvent> {
        let now = self.clock.now();
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => {
                log::error!("engine state lock poisoned");
                return None;
            }
        };
        refresh(&mut state, now);
        if state.phase == Phase::Ready && !state.ready_announced {
            state.ready_announced = true;
            return Some(event(AuthStatus::Ready, READY_MESSAGE, now));
        }
        None
    }

    /// Runs one scanned string through the pipeline.
    ///
    /// Returns `None` when the scan is ignored: during a cooldown, or while
    /// another scan is being processed. Otherwise returns the attempt's events
    /// and, on success, its mission. Never panics on malformed input.
    pub fn attempt(&self, candidate: &str) -> Option<AttemptOutcome> {
        let mut state = match self.state.try_lock() {
            Ok(state) => state,
            Err(TryLockError::WouldBlock) => {
                log::debug!("scan dropped: another attempt is in progress");
                return None;
            }
            Err(TryLockError::Poisoned(_)) => {
                return Some(self.failed_without_state(AuthError::internal(
                    "engine state lock poisoned",
                )));
            }
        };

        let now = self.clock.now();
        refresh(&mut state, now);
        if matches!(state.phase, Phase::Cooldown { .. }) {
            return None;
        }

        let ready = (!state.ready_announced).then(|| {
            state.ready_announced = true;
            event(AuthStatus::Ready, READY_MESSAGE, now)
        });

        log::info!("QR code detected, processing");
        state.phase = Phase::Processing;
        let processing = event(AuthStatus::Processing, PROCESSING_MESSAGE, now);
        let result = self.run_pipeline(&mut state, candidate, now);
        let finished = self.clock.now();

        match result {
            Ok(mission) => {
                let until = finished.saturating_add(self.config.cooldown());
                state.phase = Phase::Cooldown { until };
                state.ready_announced = false;
                log::info!(
                    "mission authenticated: {}; scanning disabled for {}s",
                    mission.name(),
                    self.config.cooldown_seconds
                );
                let terminal = event(
                    AuthStatus::Success,
                    format!("Mission loaded: {}", mission.name()),
                    finished,
                );
                Some(AttemptOutcome {
                    ready,
                    processing,
                    terminal,
                    mission: Some(mission),
                    failure: None,
                })
            }
            Err(err) => {
                state.phase = Phase::Ready;
                log_rejection(&err);
                Some(AttemptOutcome {
                    ready,
                    processing,
                    terminal: event(err.status(), err.status_message(), finished),
                    mission: None,
                    failure: Some(err),
                })
            }
        }
    }

    /// Current phase, after applying any elapsed cooldown.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the state lock is poisoned.
    pub fn phase(&self) -> AuthResult<EnginePhase> {
        let now = self.clock.now();
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::internal("engine state lock poisoned"))?;
        refresh(&mut state, now);
        Ok(match state.phase {
            Phase::Ready => EnginePhase::Ready,
            Phase::Processing => EnginePhase::Processing,
            Phase::Cooldown { .. } => EnginePhase::Cooldown,
        })
    }

    /// Whether `token` is currently remembered as consumed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Internal`] if the state lock is poisoned.
    pub fn is_consumed(&self, token: &str) -> AuthResult<bool> {
        let now = self.clock.unix_seconds();
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::internal("engine state lock poisoned"))?;
        Ok(state.guard.is_consumed(token, now))
    }

    fn run_pipeline(
        &self,
        state: &mut EngineState,
        candidate: &str,
        now: Duration,
    ) -> AuthResult<DecryptedMission> {
        let now_secs = i64::try_from(now.as_secs()).unwrap_or(i64::MAX);

        let payload = payload::decode(candidate, self.config.max_payload_len())?;
        guard::check_freshness(&payload, now_secs, &self.config)?;
        state.guard.check(&payload.token, now_secs)?;

        match self.verify_and_open(&payload) {
            Ok(mission) => {
                state
                    .guard
                    .consume(&payload.token, payload.timestamp, now_secs);
                Ok(mission)
            }
            Err(err) => {
                if err.counts_as_failed_attempt()
                    && state
                        .guard
                        .record_failure(&payload.token, payload.timestamp, now_secs)
                {
                    log::warn!("token burned after repeated failed attempts");
                }
                Err(err)
            }
        }
    }

    fn verify_and_open(&self, payload: &RawPayload) -> AuthResult<DecryptedMission> {
        let secret = integrity::verify(&self.keyring, payload)?;
        let plaintext = cipher::decrypt_mission(secret, payload)?;
        Ok(mission::assemble(plaintext))
    }

    fn failed_without_state(&self, err: AuthError) -> AttemptOutcome {
        let now = self.clock.now();
        log_rejection(&err);
        AttemptOutcome {
            ready: None,
            processing: event(AuthStatus::Processing, PROCESSING_MESSAGE, now),
            terminal: event(err.status(), err.status_message(), now),
            mission: None,
            failure: Some(err),
        }
    }
}

fn refresh(state: &mut EngineState, now: Duration) {
    if let Phase::Cooldown { until } = state.phase {
        if now >= until {
            state.phase = Phase::Ready;
            state.ready_announced = false;
            log::info!("QR scanning re-enabled");
        }
    }
}

fn event(status: AuthStatus, message: impl Into<String>, at: Duration) -> AuthEvent {
    AuthEvent::new(status, message, at.as_secs_f64())
}

fn log_rejection(err: &AuthError) {
    match err {
        AuthError::Replay => log::error!("REPLAY ATTACK DETECTED: {err}"),
        AuthError::Integrity(_) => log::error!("HMAC verification failed: {err}"),
        AuthError::Expired { .. } => log::warn!("QR code expired: {err}"),
        AuthError::Internal(_) => log::error!("{err}"),
        AuthError::Decode(_) | AuthError::Decryption(_) => log::warn!("{err}"),
    }
}
