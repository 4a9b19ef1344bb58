//! Result and error types for selenide.
//!
//! Errors fall in two classes. Retryable errors describe a page that is not
//! ready yet (absent, hidden, detached); the wait engine swallows them and
//! only reports the last one as the reason of a [`SelenideError::Timeout`].
//! Everything else is fatal and aborts a wait on first sight.

use thiserror::Error;

/// Result type for selenide operations
pub type SelenideResult<T> = Result<T, SelenideError>;

/// Errors that can occur in selenide
#[derive(Debug, Error)]
pub enum SelenideError {
    /// Element or collection member is absent from the DOM
    #[error("{message}")]
    NoSuchElement {
        /// Driver or locator message
        message: String,
    },

    /// Element is present but cannot be acted upon (hidden, disabled, covered)
    #[error("{message}")]
    NotInteractable {
        /// Driver or readiness message
        message: String,
    },

    /// Element was detached from the DOM after it was located
    #[error("{message}")]
    StaleReference {
        /// Driver message
        message: String,
    },

    /// A `should` condition was evaluated and not satisfied
    #[error("{reason}")]
    ConditionNotMet {
        /// Why the condition did not hold
        reason: String,
    },

    /// Connection or protocol failure talking to the driver
    #[error("Driver transport failed: {message}")]
    Transport {
        /// Error message
        message: String,
    },

    /// Selector is malformed
    #[error("Invalid locator: {message}")]
    InvalidLocator {
        /// Error message
        message: String,
    },

    /// Indexed lookup past the end of a collection
    #[error("Cannot get element {index} from {locator} of size {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of elements found
        len: usize,
        /// Rendered collection locator
        locator: String,
    },

    /// Wait deadline exceeded
    #[error("Timed out after {timeout_ms}ms, while waiting for:\n\t{description}\nReason:\n\t{reason}")]
    Timeout {
        /// Timeout in milliseconds
        timeout_ms: u64,
        /// Operation and locator chain
        description: String,
        /// Last failure observed before the deadline
        reason: String,
    },

    /// Timeout policy or configuration is inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// Error message
        message: String,
    },

    /// Screenshot capture or stitching failed
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SelenideError {
    /// Whether a wait loop may swallow this error and poll again
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoSuchElement { .. }
                | Self::NotInteractable { .. }
                | Self::StaleReference { .. }
                | Self::ConditionNotMet { .. }
        )
    }

    /// Whether the error means the target is simply not there (yet)
    #[must_use]
    pub const fn is_absence(&self) -> bool {
        matches!(self, Self::NoSuchElement { .. } | Self::StaleReference { .. })
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a not-interactable error
    pub fn not_interactable(message: impl Into<String>) -> Self {
        Self::NotInteractable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(SelenideError::NoSuchElement {
            message: "no such element".into()
        }
        .is_retryable());
        assert!(SelenideError::not_interactable("element not interactable").is_retryable());
        assert!(SelenideError::StaleReference {
            message: "stale element reference".into()
        }
        .is_retryable());
        assert!(SelenideError::ConditionNotMet {
            reason: "expected size 3".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(!SelenideError::transport("connection refused").is_retryable());
        assert!(!SelenideError::InvalidLocator {
            message: "bad".into()
        }
        .is_retryable());
        assert!(!SelenideError::IndexOutOfRange {
            index: 5,
            len: 3,
            locator: "browser.all(By(css selector, li))".into()
        }
        .is_retryable());
        assert!(!SelenideError::Timeout {
            timeout_ms: 1,
            description: String::new(),
            reason: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_timeout_message_template() {
        let err = SelenideError::Timeout {
            timeout_ms: 300,
            description: "browser.element(By(css selector, a)).click".into(),
            reason: "element not interactable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 300ms, while waiting for:\n\tbrowser.element(By(css selector, a)).click\nReason:\n\telement not interactable"
        );
    }

    #[test]
    fn test_index_out_of_range_message() {
        let err = SelenideError::IndexOutOfRange {
            index: 5,
            len: 3,
            locator: "browser.all(By(css selector, li))".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot get element 5 from browser.all(By(css selector, li)) of size 3"
        );
    }

    #[test]
    fn test_absence() {
        assert!(SelenideError::StaleReference {
            message: String::new()
        }
        .is_absence());
        assert!(!SelenideError::not_interactable("x").is_absence());
    }
}
