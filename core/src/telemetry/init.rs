// ## 📂 File: `src/telemetry/init.rs`

//! Tracing subscriber setup for binaries and tests.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `level`.
///
/// Calling it more than once is a no-op.
pub fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceLock<()> = OnceLock::new();
    if INIT.get().is_some() {
        return Ok(());
    }

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).context("invalid log level filter")?,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    let _ = INIT.set(());
    Ok(())
}
