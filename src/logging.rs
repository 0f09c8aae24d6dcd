//! Diagnostic logging setup
//!
//! Logs go to stderr so they never mix with command output. The filter comes
//! from `HALFSIES_LOG` (standard `EnvFilter` syntax); without it the level is
//! `warn`, or `debug` for this crate when `--verbose` is passed.

use std::sync::Once;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_ENV: &str = "HALFSIES_LOG";

static INIT: Once = Once::new();

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,halfsies=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbose),
            )
            .try_init();
    });
}
