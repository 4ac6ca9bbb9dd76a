//! Freshness and anti-replay checks.
//!
//! Consumed tokens are remembered until `timestamp + max_expiration_seconds`,
//! the last instant at which any variant of the payload could still pass the
//! freshness check (`expiration` is unsigned, so the payload's own value is
//! not trusted for this). After that the freshness check alone rejects the
//! payload and the token is evicted.

use std::collections::{BTreeMap, HashMap};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::payload::RawPayload;

/// Upper bound on tokens with a pending failure count.
pub const MAX_TRACKED_FAILURES: usize = 1024;

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Validity window actually applied to a payload.
///
/// Missing or non-positive values fall back to the configured default; the
/// result never exceeds `max_expiration_seconds`.
#[must_use]
pub fn effective_expiration(raw: Option<i64>, config: &AuthConfig) -> i64 {
    let window = raw
        .filter(|seconds| *seconds > 0)
        .unwrap_or_else(|| to_i64(config.default_expiration_seconds));
    window.min(to_i64(config.max_expiration_seconds))
}

/// Rejects payloads whose validity window ended before `now`.
///
/// # Errors
///
/// Returns [`AuthError::Expired`] when `now > timestamp + expiration`.
pub fn check_freshness(payload: &RawPayload, now: i64, config: &AuthConfig) -> AuthResult<()> {
    let expired_at = payload
        .timestamp
        .saturating_add(effective_expiration(payload.expiration, config));
    if now > expired_at {
        return Err(AuthError::Expired { expired_at });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct FailureCount {
    attempts: u32,
    evict_after: i64,
}

/// Set of consumed tokens with expiry-based eviction.
///
/// Also tracks per-token failed attempts when a limit is configured; a token
/// that exhausts its budget is burned exactly as if it had been consumed.
#[derive(Debug)]
pub struct ReplayGuard {
    retention: i64,
    max_failed_attempts: Option<u32>,
    consumed: HashMap<String, i64>,
    by_expiry: BTreeMap<i64, Vec<String>>,
    failures: HashMap<String, FailureCount>,
}

impl ReplayGuard {
    /// Creates an empty guard.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            retention: to_i64(config.max_expiration_seconds),
            max_failed_attempts: config.max_failed_attempts_per_token,
            consumed: HashMap::new(),
            by_expiry: BTreeMap::new(),
            failures: HashMap::new(),
        }
    }

    /// Rejects `token` if it has been consumed or burned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Replay`] for a known token.
    pub fn check(&mut self, token: &str, now: i64) -> AuthResult<()> {
        self.evict(now);
        if self.consumed.contains_key(token) {
            return Err(AuthError::Replay);
        }
        Ok(())
    }

    /// Marks `token`, issued at `timestamp`, as consumed.
    pub fn consume(&mut self, token: &str, timestamp: i64, now: i64) {
        self.evict(now);
        self.failures.remove(token);
        self.insert(token, timestamp.saturating_add(self.retention));
    }

    /// Records an integrity or decryption failure against `token`.
    ///
    /// `timestamp` is unauthenticated here, so the entry is kept no later than
    /// `now + max_expiration_seconds` whatever the payload claims. Once
    /// [`MAX_TRACKED_FAILURES`] tokens are being counted, failures for new
    /// tokens are not recorded.
    ///
    /// Returns `true` if this failure exhausted the token's budget and the
    /// token is now burned.
    pub fn record_failure(&mut self, token: &str, timestamp: i64, now: i64) -> bool {
        let Some(limit) = self.max_failed_attempts else {
            return false;
        };
        self.evict(now);
        if !self.failures.contains_key(token) && self.failures.len() >= MAX_TRACKED_FAILURES {
            return false;
        }
        let evict_after = timestamp.min(now).saturating_add(self.retention);
        let entry = self
            .failures
            .entry(token.to_string())
            .or_insert(FailureCount {
                attempts: 0,
                evict_after,
            });
        entry.attempts = entry.attempts.saturating_add(1);
        entry.evict_after = entry.evict_after.max(evict_after);

        if entry.attempts < limit {
            return false;
        }
        self.failures.remove(token);
        self.insert(token, evict_after);
        true
    }

    /// Whether `token` is remembered as consumed at `now`.
    pub fn is_consumed(&mut self, token: &str, now: i64) -> bool {
        self.evict(now);
        self.consumed.contains_key(token)
    }

    /// Number of tokens currently remembered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// Whether no token is remembered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }

    fn insert(&mut self, token: &str, evict_after: i64) {
        if let Some(previous) = self.consumed.get(token).copied() {
            if previous >= evict_after {
                return;
            }
            self.unindex(token, previous);
        }
        self.consumed.insert(token.to_string(), evict_after);
        self.by_expiry
            .entry(evict_after)
            .or_default()
            .push(token.to_string());
    }

    fn unindex(&mut self, token: &str, evict_after: i64) {
        if let Some(tokens) = self.by_expiry.get_mut(&evict_after) {
            tokens.retain(|existing| existing != token);
            if tokens.is_empty() {
                self.by_expiry.remove(&evict_after);
            }
        }
    }

    fn evict(&mut self, now: i64) {
        // Keys >= now stay; everything strictly before `now` has lapsed.
        let retained = self.by_expiry.split_off(&now);
        let lapsed = std::mem::replace(&mut self.by_expiry, retained);
        for token in lapsed.into_values().flatten() {
            self.consumed.remove(&token);
        }
        self.failures.retain(|_, count| count.evict_after >= now);
    }
}
