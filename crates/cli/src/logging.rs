//! Log output for the command line tool.
//!
//! Library crates emit `tracing` events; this installs the subscriber that
//! prints them. Human-readable lines go to stderr so stdout stays clean for
//! answers like `renormalize config -s libdir`.
//!
//! The filter comes from `RENORMALIZE_LOG` (any `EnvFilter` directive, e.g.
//! `renormalize=debug`), defaulting to `warn`, or `debug` with `--verbose`.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Must be called at most once.
pub fn init(verbose: bool) {
    let default = if verbose {
        "debug"
    } else {
        config::DEFAULT_LOG_FILTER
    };
    let directive = config::env_or(config::LOG_ENV, default);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("warning: ignoring invalid {} {directive:?}: {e}", config::LOG_ENV);
        EnvFilter::new(default)
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
