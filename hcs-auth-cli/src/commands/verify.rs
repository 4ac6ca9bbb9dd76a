use hcs_auth_core::{AuthStatus, AuthenticationEngine};

use crate::config::{AuthArgs, CodeArgs};
use crate::output;

/// Runs one attempt on a fresh engine and prints its records.
///
/// Fails with a non-zero exit when the payload does not authenticate.
pub fn run(code: &CodeArgs, auth: &AuthArgs, payload: &str) -> eyre::Result<()> {
    let engine = AuthenticationEngine::with_system_clock(auth.resolve()?, code.keyring()?);
    let Some(outcome) = engine.attempt(payload.trim()) else {
        eyre::bail!("engine did not accept the payload");
    };

    let status = outcome.status();
    output::publish(&mut std::io::stdout().lock(), outcome)?;
    if status != AuthStatus::Success {
        eyre::bail!("authentication failed: {status}");
    }
    Ok(())
}
