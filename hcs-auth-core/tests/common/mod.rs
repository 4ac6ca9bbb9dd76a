//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hcs_auth_core::{
    integrity, AuthConfig, AuthenticationEngine, IssueParams, Keyring, ManualClock,
    MissionIssuer, MissionPlaintext, RawPayload, SharedSecret, WaypointPlaintext,
};

pub const CODE: &str = "F82C7S45CrA1";
pub const NOW: u64 = 1_700_000_000;

pub type TestEngine = AuthenticationEngine<Arc<ManualClock>>;

pub fn now() -> i64 {
    i64::try_from(NOW).expect("timestamp fits")
}

pub fn secret() -> SharedSecret {
    SharedSecret::new(CODE).expect("secret")
}

pub fn engine_with(config: AuthConfig) -> (Arc<ManualClock>, TestEngine) {
    let clock = Arc::new(ManualClock::at(NOW));
    let engine = AuthenticationEngine::new(config, Keyring::from(secret()), Arc::clone(&clock));
    (clock, engine)
}

pub fn engine() -> (Arc<ManualClock>, TestEngine) {
    engine_with(AuthConfig::default())
}

pub fn issuer() -> MissionIssuer {
    MissionIssuer::new(secret())
}

pub fn recon_mission() -> MissionPlaintext {
    MissionPlaintext {
        name: Some("Recon Alpha".to_string()),
        mission_type: Some("RECON".to_string()),
        priority: Some("STEALTH".to_string()),
        waypoints: Some(vec![
            WaypointPlaintext {
                lat: Some(37.7749),
                lon: Some(-122.4194),
                alt: Some(120.0),
                action: Some("SCAN".to_string()),
            },
            WaypointPlaintext {
                lat: Some(37.8044),
                lon: Some(-122.2712),
                alt: None,
                action: None,
            },
            WaypointPlaintext {
                lat: Some(37.6879),
                lon: Some(-122.4702),
                alt: Some(80.0),
                action: Some("RTH".to_string()),
            },
        ]),
        max_duration: Some(45),
        gps_allowed: Some(true),
    }
}

pub fn issue_at(timestamp: i64) -> RawPayload {
    issuer().issue(&recon_mission(), timestamp).expect("issue")
}

pub fn issue_with_token(mission: &MissionPlaintext, token: &str) -> RawPayload {
    let mut params = IssueParams::random(now());
    params.token = token.to_string();
    issuer().issue_with(mission, params).expect("issue")
}

pub fn qr(payload: &RawPayload) -> String {
    payload.to_qr_string().expect("encode")
}

/// Recomputes the tag with the real code, as an attacker holding it would.
pub fn resign(payload: &mut RawPayload) {
    payload.hmac = integrity::sign(&secret(), payload).expect("sign");
}

/// Flips one bit of the encrypted blob.
pub fn flip_ciphertext_bit(payload: &mut RawPayload, byte: usize) {
    let mut blob = STANDARD.decode(&payload.encrypted).expect("base64");
    blob[byte] ^= 0x01;
    payload.encrypted = STANDARD.encode(blob);
}
