//! Selenide: concise UI tests over WebDriver
//!
//! Lazy element handles, composable conditions and commands that wait for
//! the page instead of failing on the first slow render.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  browser.element("#save").should(be::visible()).click()      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌────────────┐   ┌─────────────┐            │
//! │  │ Locator   │──►│ Wait       │──►│ Driver      │            │
//! │  │ (lazy)    │   │ engine     │   │ (WebDriver, │            │
//! │  │           │◄──│ Conditions │   │  Mock)      │            │
//! │  └───────────┘   └────────────┘   └─────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `should` and every command is retried until it succeeds or the
//! configured timeout (4s by default) elapses. A timeout reports the whole
//! locator chain and the last reason observed:
//!
//! ```text
//! Timed out after 4000ms, while waiting for:
//!     browser.element(By(css selector, #save)).click
//! Reason:
//!     element not interactable: element is disabled
//! ```

#![warn(missing_docs)]

pub mod be;
mod browser;
mod by;
mod command;
pub mod condition;
mod config;
pub mod driver;
mod element;
pub mod have;
mod locator;
pub mod logging;
pub mod mock;
mod result;
pub mod screenshot;
pub mod wait;
#[cfg(feature = "webdriver")]
mod webdriver;

pub use browser::Browser;
pub use by::By;
pub use command::{perform, Command};
pub use condition::{
    CollectionCondition, CollectionPredicate, Condition, ElementCondition, ElementPredicate,
    Target, Verdict,
};
pub use config::{
    Configuration, ScreenshotConfig, DEFAULT_POLL_INTERVAL_MS, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_TIMEOUT_MS, ENV_HIDE_SCROLLBARS, ENV_POLL_INTERVAL_MS, ENV_SETTLE_DELAY_MS,
    ENV_TIMEOUT_MS,
};
pub use driver::{value_to_string, Driver};
pub use element::{Collection, Element};
pub use locator::Locator;
pub use mock::{MockDriver, MockElement, MockElementRef, MockFailure};
pub use result::{SelenideError, SelenideResult};
pub use wait::{hard_wait, wait_for, wait_until, Subject, TimeoutPolicy};
#[cfg(feature = "webdriver")]
pub use webdriver::{classify_error, WebDriverClient, WebElementRef, ELEMENT_KEY};

/// Everything a test file needs
pub mod prelude {
    pub use super::{be, have, perform};
    pub use super::{
        Browser, By, Collection, Command, Condition, Configuration, Driver, Element,
        SelenideError, SelenideResult, TimeoutPolicy,
    };
    #[cfg(feature = "webdriver")]
    pub use super::WebDriverClient;
}
