//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! `RUST_LOG` takes precedence; without it everything logs at `info`.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber. Call once at startup.
pub fn init_logging() -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}
