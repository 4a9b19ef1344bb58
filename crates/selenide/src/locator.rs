//! Lazy locator chains.
//!
//! A [`Locator`] is a recipe, not a result: every call to [`Locator::find`]
//! or [`Locator::find_all`] walks the chain against the live driver, so a
//! handle created before the page renders keeps working after it does.
//! Nothing is cached between calls.

use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;

use crate::by::By;
use crate::condition::{ElementCondition, Target};
use crate::driver::Driver;
use crate::result::{SelenideError, SelenideResult};

/// How to reach one element or a list of elements from the page root
#[derive(Debug, Clone)]
pub enum Locator {
    /// First page element matching `by`
    Element {
        /// Selector
        by: By,
    },
    /// All page elements matching `by`
    All {
        /// Selector
        by: By,
    },
    /// First match of `by` inside the parent element
    InnerElement {
        /// Element to search in
        parent: Arc<Locator>,
        /// Selector
        by: By,
    },
    /// All matches of `by` inside the parent element
    InnerAll {
        /// Element to search in
        parent: Arc<Locator>,
        /// Selector
        by: By,
    },
    /// Element at a position of the parent collection
    Indexed {
        /// Collection
        parent: Arc<Locator>,
        /// Zero-based position
        index: usize,
    },
    /// Members of the parent collection satisfying a condition
    Filtered {
        /// Collection
        parent: Arc<Locator>,
        /// Filter
        condition: ElementCondition,
    },
    /// First member of the parent collection satisfying a condition
    FoundBy {
        /// Collection
        parent: Arc<Locator>,
        /// Filter
        condition: ElementCondition,
    },
}

impl Locator {
    /// Whether the locator yields a list rather than a single element
    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(self, Self::All { .. } | Self::InnerAll { .. } | Self::Filtered { .. })
    }

    /// Resolve every element the locator currently yields
    pub fn find_all<'a, D: Driver>(
        &'a self,
        driver: &'a D,
    ) -> BoxFuture<'a, SelenideResult<Vec<D::Element>>> {
        async move {
            match self {
                Self::Element { by } | Self::All { by } => {
                    by.validate()?;
                    driver.find_elements(by, None).await
                }
                Self::InnerElement { parent, by } | Self::InnerAll { parent, by } => {
                    by.validate()?;
                    let scope = parent.find(driver).await?;
                    driver.find_elements(by, Some(&scope)).await
                }
                Self::Indexed { .. } | Self::FoundBy { .. } => Ok(vec![self.find(driver).await?]),
                Self::Filtered { parent, condition } => {
                    let mut matching = Vec::new();
                    for element in parent.find_all(driver).await? {
                        if condition
                            .evaluate(driver, Target::Found(&element))
                            .await?
                            .satisfied
                        {
                            matching.push(element);
                        }
                    }
                    Ok(matching)
                }
            }
        }
        .boxed()
    }

    /// Resolve the single element the locator points at
    pub fn find<'a, D: Driver>(&'a self, driver: &'a D) -> BoxFuture<'a, SelenideResult<D::Element>> {
        async move {
            match self {
                Self::Element { by } | Self::InnerElement { by, .. } => self
                    .find_all(driver)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| not_found(by)),
                Self::Indexed { parent, index } => {
                    let elements = parent.find_all(driver).await?;
                    let len = elements.len();
                    elements
                        .into_iter()
                        .nth(*index)
                        .ok_or_else(|| SelenideError::IndexOutOfRange {
                            index: *index,
                            len,
                            locator: parent.to_string(),
                        })
                }
                Self::FoundBy { parent, condition } => {
                    for element in parent.find_all(driver).await? {
                        if condition
                            .evaluate(driver, Target::Found(&element))
                            .await?
                            .satisfied
                        {
                            return Ok(element);
                        }
                    }
                    Err(SelenideError::NoSuchElement {
                        message: format!("no such element: no element of {parent} has {condition}"),
                    })
                }
                Self::All { .. } | Self::InnerAll { .. } | Self::Filtered { .. } => self
                    .find_all(driver)
                    .await?
                    .into_iter()
                    .next()
                    .ok_or_else(|| SelenideError::NoSuchElement {
                        message: format!("no such element: {self} is empty"),
                    }),
            }
        }
        .boxed()
    }
}

fn not_found(by: &By) -> SelenideError {
    SelenideError::NoSuchElement {
        message: format!(
            "no such element: Unable to locate element: {}",
            by.to_diagnostic_json()
        ),
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element { by } => write!(f, "browser.element({by})"),
            Self::All { by } => write!(f, "browser.all({by})"),
            Self::InnerElement { parent, by } => write!(f, "{parent}.element({by})"),
            Self::InnerAll { parent, by } => write!(f, "{parent}.all({by})"),
            Self::Indexed { parent, index } => write!(f, "{parent}.get({index})"),
            Self::Filtered { parent, condition } => write!(f, "{parent}.filtered_by({condition})"),
            Self::FoundBy { parent, condition } => write!(f, "{parent}.element_by({condition})"),
        }
    }
}
