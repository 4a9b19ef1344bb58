//! Process-wide defaults.
//!
//! A [`Configuration`] is an immutable value handed to a [`crate::Browser`]
//! and copied into every handle it creates. Per-call overrides go through
//! [`crate::Element::with_timeout`] and friends; nothing here is global.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::result::{SelenideError, SelenideResult};
use crate::wait::TimeoutPolicy;

/// Default timeout for waits (4 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 4_000;

/// Default polling interval (100ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Default pause between scrolling and capturing a screenshot segment
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Environment variable overriding the wait timeout
pub const ENV_TIMEOUT_MS: &str = "SELENIDE_TIMEOUT_MS";
/// Environment variable overriding the poll interval
pub const ENV_POLL_INTERVAL_MS: &str = "SELENIDE_POLL_INTERVAL_MS";
/// Environment variable overriding the screenshot settle delay
pub const ENV_SETTLE_DELAY_MS: &str = "SELENIDE_SETTLE_DELAY_MS";
/// Environment variable toggling scrollbar hiding for screenshots
pub const ENV_HIDE_SCROLLBARS: &str = "SELENIDE_HIDE_SCROLLBARS";

/// Full page screenshot settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Pause after each scroll before capturing
    pub settle_delay_ms: u64,
    /// Hide document scrollbars while capturing
    pub hide_scrollbars: bool,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            hide_scrollbars: true,
        }
    }
}

/// Defaults shared by every handle created from one browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Wait timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Screenshot settings
    pub screenshot: ScreenshotConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            screenshot: ScreenshotConfig::default(),
        }
    }
}

impl Configuration {
    /// Create configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set screenshot settle delay in milliseconds
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay_ms: u64) -> Self {
        self.screenshot.settle_delay_ms = settle_delay_ms;
        self
    }

    /// Toggle scrollbar hiding during screenshots
    #[must_use]
    pub const fn with_hidden_scrollbars(mut self, hide: bool) -> Self {
        self.screenshot.hide_scrollbars = hide;
        self
    }

    /// Wait policy derived from this configuration
    #[must_use]
    pub const fn policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.timeout_ms, self.poll_interval_ms)
    }

    /// Check the timeout invariants
    pub fn validate(&self) -> SelenideResult<()> {
        self.policy().validate()
    }

    /// Load from a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> SelenideResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> SelenideResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Defaults overlaid with `SELENIDE_*` environment variables
    pub fn from_env() -> SelenideResult<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup` (keyed by the `ENV_*` names)
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> SelenideResult<Self> {
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = parse_millis(ENV_TIMEOUT_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_millis(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_SETTLE_DELAY_MS) {
            self.screenshot.settle_delay_ms = parse_millis(ENV_SETTLE_DELAY_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_HIDE_SCROLLBARS) {
            self.screenshot.hide_scrollbars = parse_flag(ENV_HIDE_SCROLLBARS, &value)?;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_millis(key: &str, value: &str) -> SelenideResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|e| SelenideError::InvalidConfiguration {
            message: format!("{key}={value:?}: {e}"),
        })
}

fn parse_flag(key: &str, value: &str) -> SelenideResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SelenideError::InvalidConfiguration {
            message: format!("{key}={other:?} is not a boolean"),
        }),
    }
}
