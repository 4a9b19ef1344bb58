//! Selector strategies.
//!
//! Mirrors the W3C WebDriver location strategies. Plain strings convert to
//! CSS selectors, so `browser.element("a")` and
//! `browser.element(By::css("a"))` are the same locator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{SelenideError, SelenideResult};

/// How to find elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "using", content = "value")]
pub enum By {
    /// CSS selector (e.g., "button.primary")
    #[serde(rename = "css selector")]
    Css(String),
    /// XPath expression
    #[serde(rename = "xpath")]
    XPath(String),
    /// Anchor whose visible text equals the value
    #[serde(rename = "link text")]
    LinkText(String),
    /// Anchor whose visible text contains the value
    #[serde(rename = "partial link text")]
    PartialLinkText(String),
    /// Tag name
    #[serde(rename = "tag name")]
    TagName(String),
}

impl By {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a link text selector
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Create a partial link text selector
    #[must_use]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Create a tag name selector
    #[must_use]
    pub fn tag_name(name: impl Into<String>) -> Self {
        Self::TagName(name.into())
    }

    /// Select by `id` attribute
    #[must_use]
    pub fn id(id: &str) -> Self {
        Self::Css(format!("[id={}]", css_string(id)))
    }

    /// Select by `name` attribute
    #[must_use]
    pub fn name(name: &str) -> Self {
        Self::Css(format!("[name={}]", css_string(name)))
    }

    /// Select by `data-testid` attribute
    #[must_use]
    pub fn test_id(id: &str) -> Self {
        Self::Css(format!("[data-testid={}]", css_string(id)))
    }

    /// W3C location strategy name
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css selector",
            Self::XPath(_) => "xpath",
            Self::LinkText(_) => "link text",
            Self::PartialLinkText(_) => "partial link text",
            Self::TagName(_) => "tag name",
        }
    }

    /// Raw selector value
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v)
            | Self::XPath(v)
            | Self::LinkText(v)
            | Self::PartialLinkText(v)
            | Self::TagName(v) => v,
        }
    }

    /// `{"method": ..., "selector": ...}` as reported by drivers in not-found errors
    #[must_use]
    pub fn to_diagnostic_json(&self) -> String {
        serde_json::json!({ "method": self.strategy(), "selector": self.value() }).to_string()
    }

    /// Reject selectors that can never match
    pub fn validate(&self) -> SelenideResult<()> {
        if self.value().trim().is_empty() {
            return Err(SelenideError::InvalidLocator {
                message: format!("empty {} selector", self.strategy()),
            });
        }
        Ok(())
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "By({}, {})", self.strategy(), self.value())
    }
}

impl From<&str> for By {
    fn from(selector: &str) -> Self {
        Self::css(selector)
    }
}

impl From<String> for By {
    fn from(selector: String) -> Self {
        Self::Css(selector)
    }
}

impl From<&String> for By {
    fn from(selector: &String) -> Self {
        Self::Css(selector.clone())
    }
}

/// Quote a value as a CSS string literal
fn css_string(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
