//! Element commands.
//!
//! Every interaction is a [`Command`] run by one executor: inside a single
//! wait, resolve the element, check the command's readiness condition, then
//! call the driver primitive. A stale or covered element at any of those
//! steps is retried until the element's timeout.

use std::fmt;

use crate::be;
use crate::condition::{ElementCondition, Target};
use crate::driver::Driver;
use crate::element::Element;
use crate::result::{SelenideError, SelenideResult};
use crate::wait::wait_until;

/// An interaction with a single element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Left click
    Click,
    /// Double click
    DoubleClick,
    /// Right click
    ContextClick,
    /// Move the pointer over the element
    Hover,
    /// Append text to the element's value
    Type(String),
    /// Replace the element's value
    SetValue(String),
    /// Empty the element's value
    Clear,
    /// Scroll the element to the middle of the viewport
    ScrollIntoView,
}

impl Command {
    /// Condition the element must satisfy before the primitive runs
    #[must_use]
    pub fn readiness(&self) -> ElementCondition {
        match self {
            Self::ScrollIntoView => be::present(),
            Self::Hover => be::visible(),
            Self::Click
            | Self::DoubleClick
            | Self::ContextClick
            | Self::Type(_)
            | Self::SetValue(_)
            | Self::Clear => be::visible().and(be::enabled()),
        }
    }

    /// Run the command against `element`, waiting up to its timeout
    pub async fn perform<D: Driver>(&self, element: &Element<D>) -> SelenideResult<()> {
        let description = format!("{element}.{self}");
        let readiness = self.readiness();
        let driver = element.driver().as_ref();
        let locator = element.locator();
        let readiness = &readiness;
        wait_until(&description, element.policy(), move || async move {
            let found = locator.find(driver).await?;
            let verdict = readiness.evaluate(driver, Target::Found(&found)).await?;
            if !verdict.satisfied {
                return Err(SelenideError::not_interactable(format!(
                    "element not interactable: {}",
                    verdict.reason
                )));
            }
            self.apply(driver, &found).await
        })
        .await
    }

    async fn apply<D: Driver>(&self, driver: &D, element: &D::Element) -> SelenideResult<()> {
        match self {
            Self::Click => driver.click(element).await,
            Self::DoubleClick => driver.double_click(element).await,
            Self::ContextClick => driver.context_click(element).await,
            Self::Hover => driver.hover(element).await,
            Self::Type(text) => driver.send_keys(element, text).await,
            Self::SetValue(text) => {
                driver.clear(element).await?;
                driver.send_keys(element, text).await
            }
            Self::Clear => driver.clear(element).await,
            Self::ScrollIntoView => driver.scroll_into_view(element).await,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click => f.write_str("click"),
            Self::DoubleClick => f.write_str("double_click"),
            Self::ContextClick => f.write_str("context_click"),
            Self::Hover => f.write_str("hover"),
            Self::Type(text) => write!(f, "type_text('{text}')"),
            Self::SetValue(text) => write!(f, "set_value('{text}')"),
            Self::Clear => f.write_str("clear"),
            Self::ScrollIntoView => f.write_str("scroll_into_view"),
        }
    }
}

/// Command factories: `element.perform(&perform::click())`
pub mod perform {
    use super::Command;

    /// Left click
    #[must_use]
    pub const fn click() -> Command {
        Command::Click
    }

    /// Double click
    #[must_use]
    pub const fn double_click() -> Command {
        Command::DoubleClick
    }

    /// Right click
    #[must_use]
    pub const fn context_click() -> Command {
        Command::ContextClick
    }

    /// Hover
    #[must_use]
    pub const fn hover() -> Command {
        Command::Hover
    }

    /// Type text
    #[must_use]
    pub fn type_text(text: impl Into<String>) -> Command {
        Command::Type(text.into())
    }

    /// Replace value
    #[must_use]
    pub fn set_value(text: impl Into<String>) -> Command {
        Command::SetValue(text.into())
    }

    /// Clear value
    #[must_use]
    pub const fn clear() -> Command {
        Command::Clear
    }

    /// Scroll into view
    #[must_use]
    pub const fn scroll_into_view() -> Command {
        Command::ScrollIntoView
    }
}
