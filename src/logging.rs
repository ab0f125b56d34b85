//! Global logging setup for the binaries.

use anyhow::{Context, Result};
use std::{env, io, panic};
use tracing_subscriber::{
    fmt::{self, time::uptime},
    prelude::*,
    EnvFilter, Registry,
};

/// Our crate logs at info, everything else at warn.
const DEFAULT_FILTER: &str = "warn,dicebox=info";

/// Installs a compact `tracing` subscriber writing to stderr. `RUST_LOG` directives are appended
/// to the default filter. Panics are routed through the logger as well.
pub fn init_logging() -> Result<()> {
    let format = fmt::format().compact().with_timer(uptime()).with_line_number(true);
    let stderr_log = fmt::layer().event_format(format).with_writer(io::stderr);

    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }

    let subscriber = Registry::default().with(EnvFilter::new(filter)).with(stderr_log);
    tracing::subscriber::set_global_default(subscriber).context("unable to install log subscriber")?;

    panic::set_hook(Box::new(|info| {
        tracing::error!("{}", info);
    }));
    tracing::trace!("installed custom panic hook");
    Ok(())
}
