//! Element and collection handles.
//!
//! A handle pairs a shared driver with a lazy [`Locator`] and the timeout
//! policy inherited from the browser configuration. Handles are cheap to
//! clone and never hold live element references.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::by::By;
use crate::command::Command;
use crate::condition::{
    CollectionCondition, CollectionPredicate, ElementCondition, ElementPredicate, Target, Verdict,
};
use crate::driver::Driver;
use crate::locator::Locator;
use crate::result::{SelenideError, SelenideResult};
use crate::wait::{wait_for, wait_until, Subject, TimeoutPolicy};

// =============================================================================
// ELEMENT
// =============================================================================

/// Lazy handle to a single element
pub struct Element<D: Driver> {
    driver: Arc<D>,
    locator: Arc<Locator>,
    policy: TimeoutPolicy,
}

impl<D: Driver> Element<D> {
    pub(crate) fn new(driver: Arc<D>, locator: Locator, policy: TimeoutPolicy) -> Self {
        Self {
            driver,
            locator: Arc::new(locator),
            policy,
        }
    }

    /// Shared driver
    #[must_use]
    pub const fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Locator chain
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Wait policy used by `should` and commands
    #[must_use]
    pub const fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Same element with a different timeout; the poll interval shrinks to fit
    #[must_use]
    pub fn with_timeout(&self, timeout_ms: u64) -> Self {
        self.with_policy(self.policy.fit_timeout(timeout_ms))
    }

    /// Same element with a different wait policy
    #[must_use]
    pub fn with_policy(&self, policy: TimeoutPolicy) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            locator: Arc::clone(&self.locator),
            policy,
        }
    }

    /// Resolve once, without waiting
    pub async fn find(&self) -> SelenideResult<D::Element> {
        self.locator.find(self.driver.as_ref()).await
    }

    /// First descendant matching `by`
    #[must_use]
    pub fn element(&self, by: impl Into<By>) -> Self {
        Self::new(
            Arc::clone(&self.driver),
            Locator::InnerElement {
                parent: Arc::clone(&self.locator),
                by: by.into(),
            },
            self.policy,
        )
    }

    /// All descendants matching `by`
    #[must_use]
    pub fn all(&self, by: impl Into<By>) -> Collection<D> {
        Collection::new(
            Arc::clone(&self.driver),
            Locator::InnerAll {
                parent: Arc::clone(&self.locator),
                by: by.into(),
            },
            self.policy,
        )
    }

    /// Wait until `condition` holds
    pub async fn should(&self, condition: ElementCondition) -> SelenideResult<&Self> {
        self.should_with(condition, self.policy).await
    }

    /// Wait until `condition` does not hold
    pub async fn should_not(&self, condition: ElementCondition) -> SelenideResult<&Self> {
        self.should(!condition).await
    }

    /// Wait until `condition` holds, with an explicit policy
    pub async fn should_with(
        &self,
        condition: ElementCondition,
        policy: TimeoutPolicy,
    ) -> SelenideResult<&Self> {
        wait_for(self, &condition, &policy).await?;
        Ok(self)
    }

    /// Like [`Element::should`], but a timeout yields `false` instead of an error
    pub async fn wait_until(&self, condition: ElementCondition) -> SelenideResult<bool> {
        match wait_for(self, &condition, &self.policy).await {
            Ok(()) => Ok(true),
            Err(SelenideError::Timeout { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the element is in the DOM right now
    pub async fn is_present(&self) -> SelenideResult<bool> {
        match self.find().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_absence() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the element is rendered right now; absent counts as not displayed
    pub async fn is_displayed(&self) -> SelenideResult<bool> {
        let displayed = match self.find().await {
            Ok(element) => self.driver.is_displayed(&element).await,
            Err(e) => Err(e),
        };
        match displayed {
            Err(e) if e.is_absence() => Ok(false),
            other => other,
        }
    }

    /// Run a command, waiting for the element to be ready
    pub async fn perform(&self, command: &Command) -> SelenideResult<&Self> {
        command.perform(self).await?;
        Ok(self)
    }

    /// Click
    pub async fn click(&self) -> SelenideResult<&Self> {
        self.perform(&Command::Click).await
    }

    /// Double click
    pub async fn double_click(&self) -> SelenideResult<&Self> {
        self.perform(&Command::DoubleClick).await
    }

    /// Right click
    pub async fn context_click(&self) -> SelenideResult<&Self> {
        self.perform(&Command::ContextClick).await
    }

    /// Move the pointer over the element
    pub async fn hover(&self) -> SelenideResult<&Self> {
        self.perform(&Command::Hover).await
    }

    /// Append text
    pub async fn type_text(&self, text: impl Into<String>) -> SelenideResult<&Self> {
        self.perform(&Command::Type(text.into())).await
    }

    /// Replace the value
    pub async fn set_value(&self, text: impl Into<String>) -> SelenideResult<&Self> {
        self.perform(&Command::SetValue(text.into())).await
    }

    /// Empty the value
    pub async fn clear(&self) -> SelenideResult<&Self> {
        self.perform(&Command::Clear).await
    }

    /// Scroll to the middle of the viewport
    pub async fn scroll_into_view(&self) -> SelenideResult<&Self> {
        self.perform(&Command::ScrollIntoView).await
    }

    /// Rendered text, waiting for the element to exist
    pub async fn text(&self) -> SelenideResult<String> {
        let driver = self.driver.as_ref();
        let locator = self.locator.as_ref();
        wait_until(&format!("{self}.text"), &self.policy, move || async move {
            driver.text(&locator.find(driver).await?).await
        })
        .await
    }

    /// Attribute value, waiting for the element to exist
    pub async fn attribute(&self, name: &str) -> SelenideResult<Option<String>> {
        let driver = self.driver.as_ref();
        let locator = self.locator.as_ref();
        let description = format!("{self}.attribute({name})");
        wait_until(&description, &self.policy, move || async move {
            driver.attribute(&locator.find(driver).await?, name).await
        })
        .await
    }

    /// Form value, waiting for the element to exist
    pub async fn value(&self) -> SelenideResult<Option<String>> {
        let driver = self.driver.as_ref();
        let locator = self.locator.as_ref();
        wait_until(&format!("{self}.value"), &self.policy, move || async move {
            driver.value(&locator.find(driver).await?).await
        })
        .await
    }
}

impl<D: Driver> Clone for Element<D> {
    fn clone(&self) -> Self {
        self.with_policy(self.policy)
    }
}

impl<D: Driver> fmt::Display for Element<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.locator, f)
    }
}

impl<D: Driver> fmt::Debug for Element<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("locator", &self.locator.to_string())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Driver> Subject for Element<D> {
    type Predicate = ElementPredicate;

    async fn evaluate(&self, condition: &ElementCondition) -> SelenideResult<Verdict> {
        let driver = self.driver.as_ref();
        match self.locator.find(driver).await {
            Ok(element) => condition.evaluate(driver, Target::Found(&element)).await,
            Err(e) if e.is_absence() => {
                let reason = e.to_string();
                condition.evaluate(driver, Target::Missing(&reason)).await
            }
            Err(e) => Err(e),
        }
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// Lazy handle to a list of elements
pub struct Collection<D: Driver> {
    driver: Arc<D>,
    locator: Arc<Locator>,
    policy: TimeoutPolicy,
}

impl<D: Driver> Collection<D> {
    pub(crate) fn new(driver: Arc<D>, locator: Locator, policy: TimeoutPolicy) -> Self {
        Self {
            driver,
            locator: Arc::new(locator),
            policy,
        }
    }

    /// Locator chain
    #[must_use]
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Wait policy used by `should`
    #[must_use]
    pub const fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }

    /// Same collection with a different timeout; the poll interval shrinks to fit
    #[must_use]
    pub fn with_timeout(&self, timeout_ms: u64) -> Self {
        self.with_policy(self.policy.fit_timeout(timeout_ms))
    }

    /// Same collection with a different wait policy
    #[must_use]
    pub fn with_policy(&self, policy: TimeoutPolicy) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            locator: Arc::clone(&self.locator),
            policy,
        }
    }

    /// Resolve once, without waiting
    pub async fn find_all(&self) -> SelenideResult<Vec<D::Element>> {
        self.locator.find_all(self.driver.as_ref()).await
    }

    /// Element at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Element<D> {
        Element::new(
            Arc::clone(&self.driver),
            Locator::Indexed {
                parent: Arc::clone(&self.locator),
                index,
            },
            self.policy,
        )
    }

    /// First element
    #[must_use]
    pub fn first(&self) -> Element<D> {
        self.get(0)
    }

    /// Members satisfying `condition`
    #[must_use]
    pub fn filtered_by(&self, condition: ElementCondition) -> Self {
        Self::new(
            Arc::clone(&self.driver),
            Locator::Filtered {
                parent: Arc::clone(&self.locator),
                condition,
            },
            self.policy,
        )
    }

    /// First member satisfying `condition`
    #[must_use]
    pub fn element_by(&self, condition: ElementCondition) -> Element<D> {
        Element::new(
            Arc::clone(&self.driver),
            Locator::FoundBy {
                parent: Arc::clone(&self.locator),
                condition,
            },
            self.policy,
        )
    }

    /// Wait until `condition` holds
    pub async fn should(&self, condition: CollectionCondition) -> SelenideResult<&Self> {
        self.should_with(condition, self.policy).await
    }

    /// Wait until `condition` holds, with an explicit policy
    pub async fn should_with(
        &self,
        condition: CollectionCondition,
        policy: TimeoutPolicy,
    ) -> SelenideResult<&Self> {
        wait_for(self, &condition, &policy).await?;
        Ok(self)
    }

    /// Number of elements, waiting only for the chain's parents to exist
    pub async fn size(&self) -> SelenideResult<usize> {
        let driver = self.driver.as_ref();
        let locator = self.locator.as_ref();
        wait_until(&format!("{self}.size"), &self.policy, move || async move {
            Ok(locator.find_all(driver).await?.len())
        })
        .await
    }

    /// Text of every element, in document order
    pub async fn texts(&self) -> SelenideResult<Vec<String>> {
        let driver = self.driver.as_ref();
        let locator = self.locator.as_ref();
        wait_until(&format!("{self}.texts"), &self.policy, move || async move {
            let mut texts = Vec::new();
            for element in locator.find_all(driver).await? {
                texts.push(driver.text(&element).await?);
            }
            Ok(texts)
        })
        .await
    }
}

impl<D: Driver> Clone for Collection<D> {
    fn clone(&self) -> Self {
        self.with_policy(self.policy)
    }
}

impl<D: Driver> fmt::Display for Collection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.locator, f)
    }
}

impl<D: Driver> fmt::Debug for Collection<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("locator", &self.locator.to_string())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Driver> Subject for Collection<D> {
    type Predicate = CollectionPredicate;

    async fn evaluate(&self, condition: &CollectionCondition) -> SelenideResult<Verdict> {
        let driver = self.driver.as_ref();
        match self.locator.find_all(driver).await {
            Ok(elements) => condition.evaluate(driver, &elements).await,
            Err(e) if e.is_absence() => Ok(Verdict::unsatisfied(e.to_string())),
            Err(e) => Err(e),
        }
    }
}
