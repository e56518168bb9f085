use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Initialize logging on stderr. stdout is reserved for the response body.
///
/// `RUST_LOG` picks the filter; `verbose` forces debug output for this crate.
pub fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        EnvFilter::new(filter_directive(true))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directive(false)))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {e}"))?;

    tracing::debug!("logging initialized");
    Ok(())
}

fn filter_directive(verbose: bool) -> &'static str {
    if verbose {
        "warn,convai=debug"
    } else {
        "warn"
    }
}

#[test]
fn test_filter_directives_parse() {
    for verbose in [false, true] {
        assert!(filter_directive(verbose).parse::<EnvFilter>().is_ok());
    }
}
