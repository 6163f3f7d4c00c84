//! Diagnostics via `RUST_LOG`, written to stderr.
//!
//! Prompts and the run summary go to stdout; the activity log
//! (`activity.rs`) is the persistent record of tracker changes and is
//! written regardless of the filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Defaults to `warn` so unresolved dependencies and aborts are visible.
///
/// ```bash
/// RUST_LOG=csv_to_jira=debug csv-to-jira create-issues plan.csv PROJ
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
