//! In-memory driver for unit tests.
//!
//! [`MockDriver`] keeps a flat list of elements with their text, attributes
//! and visibility. Elements can appear, become visible or disappear after a
//! delay measured on the tokio clock, so tests running with
//! `#[tokio::test(start_paused = true)]` exercise real wait behaviour without
//! sleeping.
//!
//! Failure injection covers the error classes the wait engine cares about:
//! detached elements, rejected selectors, transport failures and one-shot
//! interaction failures.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::by::By;
use crate::driver::Driver;
use crate::result::{SelenideError, SelenideResult};

const STALE_MESSAGE: &str =
    "stale element reference: element is not attached to the page document";

/// Reference to an element stored in a [`MockDriver`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockElementRef {
    id: usize,
}

impl MockElementRef {
    /// Position in the driver's element list
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }
}

/// Element template added to a [`MockDriver`]
#[derive(Debug, Clone)]
pub struct MockElement {
    tag: String,
    selectors: Vec<By>,
    parent: Option<MockElementRef>,
    frame: Option<MockElementRef>,
    text: String,
    attributes: HashMap<String, String>,
    value: Option<String>,
    displayed: bool,
    enabled: bool,
    appear_after: Duration,
    visible_after: Duration,
    enabled_after: Duration,
    removed_after: Option<Duration>,
}

impl MockElement {
    /// Create a visible, enabled element; it matches `By::tag_name(tag)` and `By::css(tag)`
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            selectors: Vec::new(),
            parent: None,
            frame: None,
            text: String::new(),
            attributes: HashMap::new(),
            value: None,
            displayed: true,
            enabled: true,
            appear_after: Duration::ZERO,
            visible_after: Duration::ZERO,
            enabled_after: Duration::ZERO,
            removed_after: None,
        }
    }

    /// Also match this selector
    #[must_use]
    pub fn matching(mut self, by: impl Into<By>) -> Self {
        self.selectors.push(by.into());
        self
    }

    /// Nest inside another element
    #[must_use]
    pub const fn inside(mut self, parent: MockElementRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Place inside an iframe's document
    #[must_use]
    pub const fn in_frame(mut self, frame: MockElementRef) -> Self {
        self.frame = Some(frame);
        self
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set form value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Render as hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Render as disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Absent from the DOM until `delay` after being added
    #[must_use]
    pub const fn appearing_after(mut self, delay: Duration) -> Self {
        self.appear_after = delay;
        self
    }

    /// Hidden until `delay` after being added
    #[must_use]
    pub const fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_after = delay;
        self
    }

    /// Disabled until `delay` after being added
    #[must_use]
    pub const fn enabled_after(mut self, delay: Duration) -> Self {
        self.enabled_after = delay;
        self
    }

    /// Removed from the DOM `delay` after being added
    #[must_use]
    pub const fn removed_after(mut self, delay: Duration) -> Self {
        self.removed_after = Some(delay);
        self
    }

    fn matches(&self, by: &By) -> bool {
        if self.selectors.contains(by) {
            return true;
        }
        match by {
            By::TagName(tag) | By::Css(tag) => tag.eq_ignore_ascii_case(&self.tag),
            By::LinkText(text) => self.tag == "a" && self.text.trim() == text,
            By::PartialLinkText(text) => self.tag == "a" && self.text.contains(text.as_str()),
            By::XPath(_) => false,
        }
    }
}

/// Injected one-shot interaction failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Element detached between lookup and interaction
    Stale,
    /// Click intercepted or element not interactable
    NotInteractable,
    /// Connection dropped
    Transport,
}

impl MockFailure {
    fn into_error(self) -> SelenideError {
        match self {
            Self::Stale => SelenideError::StaleReference {
                message: STALE_MESSAGE.to_string(),
            },
            Self::NotInteractable => {
                SelenideError::not_interactable("element click intercepted")
            }
            Self::Transport => SelenideError::transport("connection reset by peer"),
        }
    }
}

/// Recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// Driver method name
    pub method: &'static str,
    /// Target element
    pub element: Option<MockElementRef>,
    /// Text or script argument
    pub argument: Option<String>,
}

#[derive(Debug)]
struct StoredElement {
    template: MockElement,
    added_at: Instant,
    detached: bool,
}

impl StoredElement {
    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.added_at)
    }

    fn is_attached(&self) -> bool {
        if self.detached {
            return false;
        }
        let elapsed = self.elapsed();
        elapsed >= self.template.appear_after
            && self.template.removed_after.map_or(true, |gone| elapsed < gone)
    }

    fn is_displayed(&self) -> bool {
        self.template.displayed && self.elapsed() >= self.template.visible_after
    }

    fn is_enabled(&self) -> bool {
        self.template.enabled && self.elapsed() >= self.template.enabled_after
    }
}

#[derive(Debug, Default)]
struct MockState {
    elements: Vec<StoredElement>,
    current_frame: Option<MockElementRef>,
    focused: Option<MockElementRef>,
    rejected: Vec<By>,
    transport_failure: Option<String>,
    interaction_failures: VecDeque<MockFailure>,
    script_rules: Vec<(String, Value)>,
    screenshots: VecDeque<Vec<u8>>,
    last_screenshot: Option<Vec<u8>>,
    calls: Vec<MockCall>,
    queries: HashMap<&'static str, usize>,
}

impl MockState {
    fn check_transport(&self) -> SelenideResult<()> {
        match &self.transport_failure {
            Some(message) => Err(SelenideError::transport(message.clone())),
            None => Ok(()),
        }
    }

    fn attached(&self, element: MockElementRef) -> SelenideResult<&StoredElement> {
        self.check_transport()?;
        self.elements
            .get(element.id)
            .filter(|stored| stored.is_attached())
            .ok_or_else(|| SelenideError::StaleReference {
                message: STALE_MESSAGE.to_string(),
            })
    }

    fn is_descendant(&self, element: MockElementRef, ancestor: MockElementRef) -> bool {
        let mut current = self.elements[element.id].template.parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.elements.get(parent.id).and_then(|e| e.template.parent);
        }
        false
    }

    fn query(&mut self, name: &'static str, element: MockElementRef) -> SelenideResult<&StoredElement> {
        *self.queries.entry(name).or_default() += 1;
        self.attached(element)
    }

    fn interact(
        &mut self,
        method: &'static str,
        element: MockElementRef,
        argument: Option<String>,
    ) -> SelenideResult<()> {
        self.attached(element)?;
        if let Some(failure) = self.interaction_failures.pop_front() {
            return Err(failure.into_error());
        }
        let stored = &self.elements[element.id];
        if !stored.is_displayed() {
            return Err(SelenideError::not_interactable("element not interactable"));
        }
        self.calls.push(MockCall {
            method,
            element: Some(element),
            argument,
        });
        Ok(())
    }

    fn record(&mut self, method: &'static str, element: Option<MockElementRef>, argument: Option<String>) {
        self.calls.push(MockCall {
            method,
            element,
            argument,
        });
    }
}

/// In-memory [`Driver`]
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl MockDriver {
    /// Create an empty page
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an element; delays count from now
    pub fn add(&self, element: MockElement) -> MockElementRef {
        let mut state = self.state();
        let id = state.elements.len();
        state.elements.push(StoredElement {
            template: element,
            added_at: Instant::now(),
            detached: false,
        });
        MockElementRef { id }
    }

    /// Remove an element; existing references become stale
    pub fn detach(&self, element: &MockElementRef) {
        if let Some(stored) = self.state().elements.get_mut(element.id) {
            stored.detached = true;
        }
    }

    /// Replace an element's text
    pub fn set_text(&self, element: &MockElementRef, text: impl Into<String>) {
        if let Some(stored) = self.state().elements.get_mut(element.id) {
            stored.template.text = text.into();
        }
    }

    /// Show or hide an element
    pub fn set_displayed(&self, element: &MockElementRef, displayed: bool) {
        if let Some(stored) = self.state().elements.get_mut(element.id) {
            stored.template.displayed = displayed;
        }
    }

    /// Enable or disable an element
    pub fn set_enabled(&self, element: &MockElementRef, enabled: bool) {
        if let Some(stored) = self.state().elements.get_mut(element.id) {
            stored.template.enabled = enabled;
        }
    }

    /// Make lookups with this selector fail as malformed
    pub fn reject_selector(&self, by: impl Into<By>) {
        self.state().rejected.push(by.into());
    }

    /// Fail every call with a transport error
    pub fn fail_transport(&self, message: impl Into<String>) {
        self.state().transport_failure = Some(message.into());
    }

    /// Clear the transport failure
    pub fn restore_transport(&self) {
        self.state().transport_failure = None;
    }

    /// Fail the next interaction (click, type, ...) once
    pub fn fail_next_interaction(&self, failure: MockFailure) {
        self.state().interaction_failures.push_back(failure);
    }

    /// Answer scripts containing `needle` with `value`; later rules win
    pub fn on_script(&self, needle: impl Into<String>, value: Value) {
        self.state().script_rules.push((needle.into(), value));
    }

    /// Queue a screenshot; the last one is repeated once the queue drains
    pub fn push_screenshot(&self, png: Vec<u8>) {
        self.state().screenshots.push_back(png);
    }

    /// Current element value
    #[must_use]
    pub fn value_of(&self, element: &MockElementRef) -> Option<String> {
        self.state()
            .elements
            .get(element.id)
            .and_then(|e| e.template.value.clone())
    }

    /// Currently selected frame
    #[must_use]
    pub fn current_frame(&self) -> Option<MockElementRef> {
        self.state().current_frame
    }

    /// Select a frame directly, as if a page had switched into it
    pub fn enter_frame(&self, frame: MockElementRef) {
        self.state().current_frame = Some(frame);
    }

    /// All recorded calls
    #[must_use]
    pub fn call_history(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    /// Whether a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.state().calls.iter().any(|c| c.method == method)
    }

    /// Number of calls to a method
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.state().calls.iter().filter(|c| c.method == method).count()
    }

    /// Executed scripts, in order
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.method == "execute_script")
            .filter_map(|c| c.argument.clone())
            .collect()
    }

    /// Number of state queries (`is_displayed`, `text`, ...) by name
    #[must_use]
    pub fn query_count(&self, name: &str) -> usize {
        self.state().queries.get(name).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Element = MockElementRef;

    async fn find_elements(
        &self,
        by: &By,
        scope: Option<&MockElementRef>,
    ) -> SelenideResult<Vec<MockElementRef>> {
        let mut state = self.state();
        state.check_transport()?;
        state.record("find_elements", scope.copied(), Some(by.to_string()));
        if state.rejected.contains(by) {
            return Err(SelenideError::InvalidLocator {
                message: format!("invalid selector: {by}"),
            });
        }
        if let Some(scope) = scope {
            state.attached(*scope)?;
        }
        let frame = state.current_frame;
        let found = state
            .elements
            .iter()
            .enumerate()
            .filter(|(_, stored)| {
                stored.is_attached() && stored.template.frame == frame && stored.template.matches(by)
            })
            .map(|(id, _)| MockElementRef { id })
            .filter(|element| scope.map_or(true, |scope| state.is_descendant(*element, *scope)))
            .collect();
        Ok(found)
    }

    async fn execute_script(&self, script: &str, args: &[MockElementRef]) -> SelenideResult<Value> {
        let mut state = self.state();
        state.check_transport()?;
        for arg in args {
            state.attached(*arg)?;
        }
        state.record("execute_script", args.first().copied(), Some(script.to_string()));
        let reply = state
            .script_rules
            .iter()
            .rev()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map_or(Value::Null, |(_, value)| value.clone());
        Ok(reply)
    }

    async fn take_screenshot(&self) -> SelenideResult<Vec<u8>> {
        let mut state = self.state();
        state.check_transport()?;
        state.record("take_screenshot", None, None);
        if let Some(png) = state.screenshots.pop_front() {
            state.last_screenshot = Some(png.clone());
            return Ok(png);
        }
        state
            .last_screenshot
            .clone()
            .ok_or_else(|| SelenideError::Screenshot {
                message: "no screenshot queued".to_string(),
            })
    }

    async fn switch_to_frame(&self, frame: &MockElementRef) -> SelenideResult<()> {
        let mut state = self.state();
        state.attached(*frame)?;
        state.record("switch_to_frame", Some(*frame), None);
        state.current_frame = Some(*frame);
        Ok(())
    }

    async fn switch_to_default_content(&self) -> SelenideResult<()> {
        let mut state = self.state();
        state.check_transport()?;
        state.record("switch_to_default_content", None, None);
        state.current_frame = None;
        Ok(())
    }

    async fn frame_element(&self) -> SelenideResult<Option<MockElementRef>> {
        let state = self.state();
        state.check_transport()?;
        Ok(state.current_frame)
    }

    async fn click(&self, element: &MockElementRef) -> SelenideResult<()> {
        let mut state = self.state();
        state.interact("click", *element, None)?;
        state.focused = Some(*element);
        Ok(())
    }

    async fn double_click(&self, element: &MockElementRef) -> SelenideResult<()> {
        self.state().interact("double_click", *element, None)
    }

    async fn context_click(&self, element: &MockElementRef) -> SelenideResult<()> {
        self.state().interact("context_click", *element, None)
    }

    async fn hover(&self, element: &MockElementRef) -> SelenideResult<()> {
        self.state().interact("hover", *element, None)
    }

    async fn send_keys(&self, element: &MockElementRef, text: &str) -> SelenideResult<()> {
        let mut state = self.state();
        state.interact("send_keys", *element, Some(text.to_string()))?;
        state.focused = Some(*element);
        let stored = &mut state.elements[element.id].template;
        stored.value.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    async fn clear(&self, element: &MockElementRef) -> SelenideResult<()> {
        let mut state = self.state();
        state.interact("clear", *element, None)?;
        state.elements[element.id].template.value = Some(String::new());
        Ok(())
    }

    async fn is_displayed(&self, element: &MockElementRef) -> SelenideResult<bool> {
        Ok(self.state().query("is_displayed", *element)?.is_displayed())
    }

    async fn is_enabled(&self, element: &MockElementRef) -> SelenideResult<bool> {
        Ok(self.state().query("is_enabled", *element)?.is_enabled())
    }

    async fn text(&self, element: &MockElementRef) -> SelenideResult<String> {
        Ok(self.state().query("text", *element)?.template.text.clone())
    }

    async fn attribute(&self, element: &MockElementRef, name: &str) -> SelenideResult<Option<String>> {
        let mut state = self.state();
        let stored = state.query("attribute", *element)?;
        Ok(stored.template.attributes.get(name).cloned())
    }

    async fn value(&self, element: &MockElementRef) -> SelenideResult<Option<String>> {
        Ok(self.state().query("value", *element)?.template.value.clone())
    }

    async fn is_focused(&self, element: &MockElementRef) -> SelenideResult<bool> {
        let mut state = self.state();
        state.query("is_focused", *element)?;
        Ok(state.focused == Some(*element))
    }

    async fn scroll_into_view(&self, element: &MockElementRef) -> SelenideResult<()> {
        let mut state = self.state();
        state.query("scroll_into_view", *element)?;
        state.record("scroll_into_view", Some(*element), None);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod lookup_tests {
        use super::*;

        #[tokio::test]
        async fn test_find_by_tag_and_extra_selector() {
            let driver = MockDriver::new();
            let button = driver.add(MockElement::new("button").matching(By::id("submit")));
            driver.add(MockElement::new("a"));

            assert_eq!(driver.find_elements(&By::css("button"), None).await.unwrap(), vec![button]);
            assert_eq!(driver.find_elements(&By::id("submit"), None).await.unwrap(), vec![button]);
            assert!(driver.find_elements(&By::css("input"), None).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_scoped_find_includes_nested() {
            let driver = MockDriver::new();
            let form = driver.add(MockElement::new("form"));
            let fieldset = driver.add(MockElement::new("fieldset").inside(form));
            let input = driver.add(MockElement::new("input").inside(fieldset));
            driver.add(MockElement::new("input"));

            let found = driver.find_elements(&By::css("input"), Some(&form)).await.unwrap();
            assert_eq!(found, vec![input]);
        }

        #[tokio::test]
        async fn test_link_text() {
            let driver = MockDriver::new();
            let link = driver.add(MockElement::new("a").with_text("Sign in"));
            assert_eq!(driver.find_elements(&By::link_text("Sign in"), None).await.unwrap(), vec![link]);
            assert_eq!(driver.find_elements(&By::partial_link_text("Sign"), None).await.unwrap(), vec![link]);
        }

        #[tokio::test]
        async fn test_rejected_selector() {
            let driver = MockDriver::new();
            driver.reject_selector("[[");
            let err = driver.find_elements(&By::css("[["), None).await.unwrap_err();
            assert!(matches!(err, SelenideError::InvalidLocator { .. }));
        }

        #[tokio::test]
        async fn test_frames_scope_lookup() {
            let driver = MockDriver::new();
            let iframe = driver.add(MockElement::new("iframe"));
            let inner = driver.add(MockElement::new("p").in_frame(iframe));
            assert!(driver.find_elements(&By::css("p"), None).await.unwrap().is_empty());
            driver.switch_to_frame(&iframe).await.unwrap();
            assert_eq!(driver.find_elements(&By::css("p"), None).await.unwrap(), vec![inner]);
            assert_eq!(driver.frame_element().await.unwrap(), Some(iframe));
        }
    }

    mod timing_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_appearing_after() {
            let driver = MockDriver::new();
            driver.add(MockElement::new("div").appearing_after(Duration::from_millis(200)));
            assert!(driver.find_elements(&By::css("div"), None).await.unwrap().is_empty());
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert_eq!(driver.find_elements(&By::css("div"), None).await.unwrap().len(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn test_removed_after_goes_stale() {
            let driver = MockDriver::new();
            let div = driver.add(MockElement::new("div").removed_after(Duration::from_millis(50)));
            assert!(driver.is_displayed(&div).await.unwrap());
            tokio::time::sleep(Duration::from_millis(60)).await;
            let err = driver.is_displayed(&div).await.unwrap_err();
            assert!(matches!(err, SelenideError::StaleReference { .. }));
        }

        #[tokio::test(start_paused = true)]
        async fn test_visible_after() {
            let driver = MockDriver::new();
            let div = driver.add(MockElement::new("div").visible_after(Duration::from_millis(100)));
            assert!(!driver.is_displayed(&div).await.unwrap());
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(driver.is_displayed(&div).await.unwrap());
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_send_keys_appends_and_clear_empties() {
            let driver = MockDriver::new();
            let input = driver.add(MockElement::new("input").with_value("a"));
            driver.send_keys(&input, "bc").await.unwrap();
            assert_eq!(driver.value_of(&input).as_deref(), Some("abc"));
            driver.clear(&input).await.unwrap();
            assert_eq!(driver.value_of(&input).as_deref(), Some(""));
            assert!(driver.is_focused(&input).await.unwrap());
        }

        #[tokio::test]
        async fn test_click_hidden_not_interactable() {
            let driver = MockDriver::new();
            let a = driver.add(MockElement::new("a").hidden());
            let err = driver.click(&a).await.unwrap_err();
            assert!(matches!(err, SelenideError::NotInteractable { .. }));
            assert!(!driver.was_called("click"));
        }

        #[tokio::test]
        async fn test_injected_failure_is_one_shot() {
            let driver = MockDriver::new();
            let a = driver.add(MockElement::new("a"));
            driver.fail_next_interaction(MockFailure::Stale);
            assert!(driver.click(&a).await.unwrap_err().is_absence());
            driver.click(&a).await.unwrap();
            assert_eq!(driver.call_count("click"), 1);
        }

        #[tokio::test]
        async fn test_transport_failure_and_restore() {
            let driver = MockDriver::new();
            let a = driver.add(MockElement::new("a"));
            driver.fail_transport("connection refused");
            assert!(matches!(
                driver.text(&a).await.unwrap_err(),
                SelenideError::Transport { .. }
            ));
            driver.restore_transport();
            assert_eq!(driver.text(&a).await.unwrap(), "");
        }
    }

    mod script_tests {
        use super::*;

        #[tokio::test]
        async fn test_script_rules_latest_wins() {
            let driver = MockDriver::new();
            driver.on_script("innerHeight", serde_json::json!(600));
            driver.on_script("innerHeight", serde_json::json!(800));
            let value = driver.execute_script("return window.innerHeight;", &[]).await.unwrap();
            assert_eq!(value, serde_json::json!(800));
            assert_eq!(driver.scripts(), vec!["return window.innerHeight;".to_string()]);
        }

        #[tokio::test]
        async fn test_screenshot_queue_repeats_last() {
            let driver = MockDriver::new();
            assert!(driver.take_screenshot().await.is_err());
            driver.push_screenshot(vec![1]);
            driver.push_screenshot(vec![2]);
            assert_eq!(driver.take_screenshot().await.unwrap(), vec![1]);
            assert_eq!(driver.take_screenshot().await.unwrap(), vec![2]);
            assert_eq!(driver.take_screenshot().await.unwrap(), vec![2]);
        }
    }
}
