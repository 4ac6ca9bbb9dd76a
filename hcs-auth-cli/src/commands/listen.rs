//! Long-running harness loop.
//!
//! A reader thread takes scan strings from stdin, one per line, and forwards
//! them over a channel. Each poll tick drains the channel and hands only the
//! newest string to the engine; older ones are stale frames.

use std::io::BufRead as _;
use std::time::Duration;

use hcs_auth_core::AuthenticationEngine;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;

use crate::config::{AuthArgs, CodeArgs};
use crate::output::{self, Record};

const SCAN_QUEUE_DEPTH: usize = 32;

fn read_scans(tx: &mpsc::Sender<String>) -> std::io::Result<()> {
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }
        if tx.blocking_send(candidate.to_string()).is_err() {
            break;
        }
    }
    Ok(())
}

/// Newest queued scan, and whether the reader is still running.
fn drain_latest(rx: &mut mpsc::Receiver<String>) -> (Option<String>, bool) {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(scan) => latest = Some(scan),
            Err(TryRecvError::Empty) => return (latest, true),
            Err(TryRecvError::Disconnected) => return (latest, false),
        }
    }
}

pub async fn run(code: &CodeArgs, auth: &AuthArgs) -> eyre::Result<()> {
    let config = auth.resolve()?;
    let poll_interval = config.poll_interval();
    let engine = AuthenticationEngine::with_system_clock(config, code.keyring()?);
    tracing::info!(
        poll_interval_ms = u64::try_from(poll_interval.as_millis()).unwrap_or(u64::MAX),
        "HCS auth harness started"
    );

    let (tx, mut rx) = mpsc::channel(SCAN_QUEUE_DEPTH);
    // Detached: a thread parked on stdin must not hold up shutdown.
    std::thread::spawn(move || {
        if let Err(err) = read_scans(&tx) {
            tracing::error!(%err, "failed to read scan input");
        }
    });

    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }

        let mut stdout = std::io::stdout().lock();
        if let Some(event) = engine.poll() {
            output::emit(&mut stdout, &Record::Status(&event))?;
        }

        let (latest, reader_alive) = drain_latest(&mut rx);
        if let Some(outcome) = latest.and_then(|scan| engine.attempt(&scan)) {
            output::publish(&mut stdout, outcome)?;
        }
        if !reader_alive {
            tracing::info!("scan input closed, shutting down");
            break;
        }
    }

    Ok(())
}
