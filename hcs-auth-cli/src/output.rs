//! JSON-lines publication of status and mission records on stdout.

use std::io::Write;

use eyre::WrapErr as _;
use hcs_auth_core::{AttemptOutcome, AuthEvent, MissionRecord};
use serde::Serialize;

/// One line on stdout, tagged with the channel it belongs to.
#[derive(Debug, Serialize)]
#[serde(tag = "channel", rename_all = "lowercase")]
pub enum Record<'a> {
    Status(&'a AuthEvent),
    Mission(&'a MissionRecord),
}

pub fn render(record: &Record<'_>) -> eyre::Result<String> {
    serde_json::to_string(record).wrap_err("failed to serialize record")
}

pub fn emit(out: &mut impl Write, record: &Record<'_>) -> eyre::Result<()> {
    writeln!(out, "{}", render(record)?).wrap_err("failed to write to stdout")?;
    out.flush().wrap_err("failed to flush stdout")
}

/// Publishes an attempt. The mission record precedes the `SUCCESS` status.
pub fn publish(out: &mut impl Write, outcome: AttemptOutcome) -> eyre::Result<()> {
    if let Some(ready) = &outcome.ready {
        emit(out, &Record::Status(ready))?;
    }
    emit(out, &Record::Status(&outcome.processing))?;
    if let Some(mission) = outcome.mission {
        emit(out, &Record::Mission(&mission.into_record()))?;
    }
    emit(out, &Record::Status(&outcome.terminal))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hcs_auth_core::{
        AuthConfig, AuthenticationEngine, Keyring, ManualClock, MissionIssuer, MissionPlaintext,
        SharedSecret,
    };

    use super::*;

    const CODE: &str = "F82C7S45CrA1";

    fn lines(outcome: AttemptOutcome) -> Vec<serde_json::Value> {
        let mut out = Vec::new();
        publish(&mut out, outcome).expect("publish");
        String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[test]
    fn test_success_publishes_mission_before_terminal_status() {
        let engine = AuthenticationEngine::new(
            AuthConfig::default(),
            Keyring::from(SharedSecret::new(CODE).expect("secret")),
            Arc::new(ManualClock::at(1_700_000_000)),
        );
        let payload = MissionIssuer::new(SharedSecret::new(CODE).expect("secret"))
            .issue(
                &MissionPlaintext {
                    name: Some("Alpha".to_string()),
                    ..MissionPlaintext::default()
                },
                1_700_000_000,
            )
            .expect("issue");

        let records = lines(engine.attempt(&payload.to_qr_string().expect("qr")).expect("outcome"));
        let channels: Vec<_> = records
            .iter()
            .map(|record| record["channel"].as_str().expect("channel").to_string())
            .collect();
        assert_eq!(channels, ["status", "status", "mission", "status"]);
        assert_eq!(records[0]["status"], "READY");
        assert_eq!(records[1]["status"], "PROCESSING");
        assert_eq!(records[2]["name"], "Alpha");
        assert_eq!(records[2]["maxDurationSec"], 1800);
        assert_eq!(records[3]["status"], "SUCCESS");
        assert_eq!(records[3]["message"], "Mission loaded: Alpha");
    }

    #[test]
    fn test_failure_publishes_no_mission() {
        let engine = AuthenticationEngine::new(
            AuthConfig::default(),
            Keyring::new(),
            Arc::new(ManualClock::at(1_700_000_000)),
        );
        engine.poll();
        let records = lines(engine.attempt("not a payload").expect("outcome"));
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|record| record["channel"] == "status"));
        assert_eq!(records[1]["status"], "ERROR");
        assert_eq!(records[1]["message"], "Invalid QR format");
    }
}
