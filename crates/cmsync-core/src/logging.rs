//! Subscriber setup for binaries embedding the push pipeline
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. `RUST_LOG` wins when set, otherwise [`DEFAULT_FILTER`] applies.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init(format: LogFormat) -> anyhow::Result<()> {
    let builder = fmt().with_env_filter(filter()).with_target(true);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Route events to the test harness's captured output
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_for_tests() {
    let _ = fmt().with_env_filter(filter()).with_test_writer().try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_test_init_is_harmless() {
        init_for_tests();
        init_for_tests();
        assert!(init(LogFormat::Pretty).is_err());
    }
}
