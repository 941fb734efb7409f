//! Log output for test runs.
//!
//! A process has one global subscriber, so [`init`] and [`init_json`] share
//! a single guard: whichever runs first picks the format for the whole run.

use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

static INSTALLED: OnceLock<Option<LogFormat>> = OnceLock::new();

fn install(format: LogFormat) -> Option<LogFormat> {
    *INSTALLED.get_or_init(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer();
        let result = match format {
            LogFormat::Text => builder.with_target(false).try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.ok().map(|()| format)
    })
}

/// Install the global subscriber with text output.
///
/// Safe to call from every test: only the first call installs anything.
/// Output goes through the test writer so `cargo test` captures it per
/// test. Returns false when JSON output or a foreign subscriber is active.
pub fn init() -> bool {
    install(LogFormat::Text) == Some(LogFormat::Text)
}

/// Same as [`init`] with JSON lines, for CI log collectors. Returns false
/// when text output or a foreign subscriber is active.
pub fn init_json() -> bool {
    install(LogFormat::Json) == Some(LogFormat::Json)
}

/// Format installed by [`init`] or [`init_json`], if either succeeded
#[must_use]
pub fn installed() -> Option<LogFormat> {
    INSTALLED.get().copied().flatten()
}
