//! Driver - the browser automation seam.
//!
//! Everything selenide needs from a browser goes through [`Driver`]: locating
//! elements, executing script, taking screenshots, switching frames and the
//! raw interaction primitives. Implementations:
//!
//! - [`crate::WebDriverClient`] - W3C WebDriver over HTTP (feature `webdriver`)
//! - [`crate::MockDriver`] - in-memory DOM for unit tests
//!
//! Element state queries (`is_displayed`, `text`, ...) have script-backed
//! default implementations so a driver only has to provide
//! `execute_script`; drivers with native endpoints override them.
//!
//! Errors returned by a driver must be classified: absent, hidden and
//! detached elements map to the retryable variants of
//! [`SelenideError`](crate::SelenideError), connection and protocol failures
//! to `Transport`, malformed selectors to `InvalidLocator`.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::slice;

use crate::by::By;
use crate::result::SelenideResult;

/// Visibility check used when a driver has no native endpoint
pub const IS_DISPLAYED_JS: &str = "var e = arguments[0]; \
var s = window.getComputedStyle(e); \
return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0' \
&& e.getClientRects().length > 0;";

/// Enabled check used when a driver has no native endpoint
pub const IS_ENABLED_JS: &str = "return !arguments[0].disabled;";

/// Visible text used when a driver has no native endpoint
pub const TEXT_JS: &str = "var e = arguments[0]; return e.innerText || e.textContent || '';";

/// Form value
pub const VALUE_JS: &str = "var v = arguments[0].value; return v === undefined ? null : v;";

/// Focus check
pub const IS_FOCUSED_JS: &str = "return document.activeElement === arguments[0];";

/// Scroll an element to the middle of the viewport
pub const SCROLL_INTO_VIEW_JS: &str =
    "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";

/// Element hosting the current browsing context, `null` at top level
pub const FRAME_ELEMENT_JS: &str = "return window.frameElement;";

/// Abstract browser driver
#[async_trait]
pub trait Driver: Send + Sync {
    /// Live element reference
    type Element: Clone + fmt::Debug + Send + Sync + 'static;

    /// Find all elements matching `by`, inside `scope` when given
    async fn find_elements(
        &self,
        by: &By,
        scope: Option<&Self::Element>,
    ) -> SelenideResult<Vec<Self::Element>>;

    /// Execute JavaScript; `args` are exposed as `arguments[0..]`
    async fn execute_script(&self, script: &str, args: &[Self::Element]) -> SelenideResult<Value>;

    /// Capture the viewport as PNG bytes
    async fn take_screenshot(&self) -> SelenideResult<Vec<u8>>;

    /// Switch the browsing context into an iframe element
    async fn switch_to_frame(&self, frame: &Self::Element) -> SelenideResult<()>;

    /// Switch back to the top-level document
    async fn switch_to_default_content(&self) -> SelenideResult<()>;

    /// Frame element hosting the current context, `None` at top level
    async fn frame_element(&self) -> SelenideResult<Option<Self::Element>>;

    /// Click an element
    async fn click(&self, element: &Self::Element) -> SelenideResult<()>;

    /// Double-click an element
    async fn double_click(&self, element: &Self::Element) -> SelenideResult<()>;

    /// Right-click an element
    async fn context_click(&self, element: &Self::Element) -> SelenideResult<()>;

    /// Move the pointer over an element
    async fn hover(&self, element: &Self::Element) -> SelenideResult<()>;

    /// Type text into an element
    async fn send_keys(&self, element: &Self::Element, text: &str) -> SelenideResult<()>;

    /// Clear an editable element
    async fn clear(&self, element: &Self::Element) -> SelenideResult<()>;

    /// Whether the element is rendered
    async fn is_displayed(&self, element: &Self::Element) -> SelenideResult<bool> {
        let value = self
            .execute_script(IS_DISPLAYED_JS, slice::from_ref(element))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Whether the element accepts input
    async fn is_enabled(&self, element: &Self::Element) -> SelenideResult<bool> {
        let value = self
            .execute_script(IS_ENABLED_JS, slice::from_ref(element))
            .await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    /// Rendered text of the element
    async fn text(&self, element: &Self::Element) -> SelenideResult<String> {
        let value = self.execute_script(TEXT_JS, slice::from_ref(element)).await?;
        Ok(value_to_string(&value).unwrap_or_default())
    }

    /// Attribute value, `None` when absent
    async fn attribute(&self, element: &Self::Element, name: &str) -> SelenideResult<Option<String>> {
        let script = format!(
            "return arguments[0].getAttribute({});",
            serde_json::to_string(name)?
        );
        let value = self.execute_script(&script, slice::from_ref(element)).await?;
        Ok(value_to_string(&value))
    }

    /// Form value, `None` for elements without one
    async fn value(&self, element: &Self::Element) -> SelenideResult<Option<String>> {
        let value = self.execute_script(VALUE_JS, slice::from_ref(element)).await?;
        Ok(value_to_string(&value))
    }

    /// Whether the element has keyboard focus
    async fn is_focused(&self, element: &Self::Element) -> SelenideResult<bool> {
        let value = self
            .execute_script(IS_FOCUSED_JS, slice::from_ref(element))
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, element: &Self::Element) -> SelenideResult<()> {
        self.execute_script(SCROLL_INTO_VIEW_JS, slice::from_ref(element))
            .await?;
        Ok(())
    }
}

/// Render a script result as text; `null` becomes `None`
#[must_use]
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
