use std::io::Read as _;
use std::path::{Path, PathBuf};

use clap::Args;
use eyre::WrapErr as _;
use hcs_auth_core::{Clock as _, MissionIssuer, MissionPlaintext, SystemClock};

use crate::config::CodeArgs;

#[derive(Debug, Args)]
pub struct IssueArgs {
    /// Mission JSON file, or `-` to read it from stdin.
    #[arg(long)]
    mission: PathBuf,

    /// Validity window in seconds written into the payload.
    #[arg(long)]
    expiration: Option<i64>,

    /// Issue time in Unix seconds. Defaults to now.
    #[arg(long)]
    timestamp: Option<i64>,

    /// Print the decoded payload JSON instead of the QR string.
    #[arg(long)]
    json: bool,
}

fn read_mission(path: &Path) -> eyre::Result<MissionPlaintext> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read mission from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read mission file {}", path.display()))?
    };
    serde_json::from_str(&raw).wrap_err("mission JSON does not match the mission shape")
}

pub fn run(code: &CodeArgs, args: &IssueArgs) -> eyre::Result<()> {
    let mission = read_mission(&args.mission)?;
    let mut issuer = MissionIssuer::new(code.secret()?);
    if let Some(seconds) = args.expiration {
        issuer = issuer.with_expiration(seconds);
    }
    let timestamp = args
        .timestamp
        .unwrap_or_else(|| SystemClock.unix_seconds());

    let payload = issuer.issue(&mission, timestamp)?;
    tracing::info!(
        token = %payload.token,
        hcs_code = %payload.hcs_code,
        timestamp,
        "issued mission payload"
    );

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).wrap_err("failed to serialize payload")?
        );
    } else {
        println!("{}", payload.to_qr_string()?);
    }
    Ok(())
}
