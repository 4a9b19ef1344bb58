//! Tracing setup for test binaries.
//!
//! The library only emits `tracing` events; installing a subscriber is the
//! caller's choice. [`init_tracing`] is a one-liner for test suites that want
//! to see wait attempts (`SELENIDE_LOG=selenide=trace`).

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::result::{SelenideError, SelenideResult};

/// Environment variable holding the filter directives
pub const ENV_LOG: &str = "SELENIDE_LOG";

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Pick filter directives: `SELENIDE_LOG`, then `RUST_LOG`, then `default`
pub fn filter_directives(lookup: impl Fn(&str) -> Option<String>, default: &str) -> String {
    lookup(ENV_LOG)
        .or_else(|| lookup("RUST_LOG"))
        .filter(|directives| !directives.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Install a global subscriber; fails if one is already set
pub fn init_tracing(default_filter: &str, format: LogFormat) -> SelenideResult<()> {
    let directives = filter_directives(|key| std::env::var(key).ok(), default_filter);
    let filter = EnvFilter::try_new(&directives).map_err(|e| SelenideError::InvalidConfiguration {
        message: format!("log filter {directives:?}: {e}"),
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).try_init(),
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
    };
    installed.map_err(|e| SelenideError::InvalidConfiguration {
        message: format!("tracing subscriber: {e}"),
    })
}
