//! `hcs-auth`: companion-computer harness and developer tooling for HCS
//! mission authentication.
//!
//! Logs go to stderr; stdout carries only status and mission JSON lines or
//! the payload/fingerprint a subcommand prints.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use eyre::WrapErr as _;
use tracing_subscriber::EnvFilter;

use crate::config::{AuthArgs, CodeArgs};

#[derive(Debug, Parser)]
#[command(name = "hcs-auth", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the authentication loop over scan strings read from stdin, one per line.
    Listen {
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        auth: AuthArgs,
    },
    /// Authenticate a single payload and print the resulting records.
    Verify {
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        auth: AuthArgs,
        /// Scanned payload string.
        payload: String,
    },
    /// Encrypt and sign a mission, printing the QR payload string.
    Issue {
        #[command(flatten)]
        code: CodeArgs,
        #[command(flatten)]
        args: commands::issue::IssueArgs,
    },
    /// Print the `hcsCode` fingerprint of the configured code.
    Fingerprint {
        #[command(flatten)]
        code: CodeArgs,
    },
}

fn init_tracing() -> eyre::Result<()> {
    tracing_log::LogTracer::init().wrap_err("failed to route log records into tracing")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .wrap_err("failed to install tracing subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;

    match cli.command {
        Command::Listen { code, auth } => commands::listen::run(&code, &auth).await,
        Command::Verify {
            code,
            auth,
            payload,
        } => commands::verify::run(&code, &auth, &payload),
        Command::Issue { code, args } => commands::issue::run(&code, &args),
        Command::Fingerprint { code } => commands::fingerprint::run(&code),
    }
}
