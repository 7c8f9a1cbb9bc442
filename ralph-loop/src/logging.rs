//! Diagnostic tracing for the `ralph-loop` CLI.
//!
//! Tracing goes to stderr and is controlled by `RUST_LOG`. Transcripts and
//! session state are product output and are written regardless of the filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Defaults to `warn` when `RUST_LOG` is unset or invalid.
///
/// ```bash
/// RUST_LOG=ralph_loop=debug ralph-loop resume --tasks-file tasks.md
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
