//! Conditions: named predicates over elements and collections.
//!
//! A [`Condition`] is a tagged tree of leaves combined with AND / OR / NOT.
//! Evaluation is structural recursion: AND stops at the first unsatisfied
//! operand, OR at the first satisfied one, and the reported reason is the one
//! of the operand that decided the outcome.
//!
//! Conditions never mutate the page. A missing element is an ordinary
//! unsatisfied state ([`Target::Missing`]), so `!be::visible()` holds for an
//! element that is not in the DOM.

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::fmt;

use crate::driver::Driver;
use crate::result::SelenideResult;

/// Outcome of one condition evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the condition holds
    pub satisfied: bool,
    /// Why it does not hold (empty when satisfied)
    pub reason: String,
}

impl Verdict {
    /// A satisfied verdict
    #[must_use]
    pub const fn satisfied() -> Self {
        Self {
            satisfied: true,
            reason: String::new(),
        }
    }

    /// An unsatisfied verdict with a reason
    #[must_use]
    pub fn unsatisfied(reason: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            reason: reason.into(),
        }
    }
}

/// An element as seen by a condition: resolved, or missing with the reason
#[derive(Debug)]
pub enum Target<'a, E> {
    /// Element resolved
    Found(&'a E),
    /// Element could not be resolved
    Missing(&'a str),
}

impl<E> Clone for Target<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Target<'_, E> {}

/// Composable condition over predicates of type `P`
#[derive(Debug, Clone)]
pub enum Condition<P> {
    /// A single predicate with its description
    Leaf {
        /// What to check
        predicate: P,
        /// Human readable name used in failure messages
        description: String,
    },
    /// All operands must hold
    And(Vec<Condition<P>>),
    /// At least one operand must hold
    Or(Vec<Condition<P>>),
    /// The operand must not hold
    Not(Box<Condition<P>>),
}

/// Condition over a single element
pub type ElementCondition = Condition<ElementPredicate>;

/// Condition over a collection of elements
pub type CollectionCondition = Condition<CollectionPredicate>;

impl<P> Condition<P> {
    /// Create a leaf condition
    pub fn leaf(predicate: P, description: impl Into<String>) -> Self {
        Self::Leaf {
            predicate,
            description: description.into(),
        }
    }

    /// Both this and `other` must hold
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::And(mut operands) => {
                operands.push(other);
                Self::And(operands)
            }
            condition => Self::And(vec![condition, other]),
        }
    }

    /// This or `other` must hold
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        match self {
            Self::Or(mut operands) => {
                operands.push(other);
                Self::Or(operands)
            }
            condition => Self::Or(vec![condition, other]),
        }
    }

    const fn is_composite(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_composite() {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl<P> std::ops::Not for Condition<P> {
    type Output = Self;

    fn not(self) -> Self {
        Self::Not(Box::new(self))
    }
}

impl<P> fmt::Display for Condition<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { description, .. } => f.write_str(description),
            Self::And(operands) | Self::Or(operands) => {
                let joiner = if matches!(self, Self::And(_)) {
                    " and "
                } else {
                    " or "
                };
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(joiner)?;
                    }
                    operand.fmt_operand(f)?;
                }
                Ok(())
            }
            Self::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_operand(f)
            }
        }
    }
}

/// Evaluates the leaves of a condition tree
pub(crate) trait LeafCheck<P>: Sync {
    fn check<'a>(&'a self, predicate: &'a P) -> BoxFuture<'a, SelenideResult<Verdict>>;
}

impl<P: Sync> Condition<P> {
    fn evaluate_with<'a, L: LeafCheck<P>>(
        &'a self,
        leaf: &'a L,
    ) -> BoxFuture<'a, SelenideResult<Verdict>> {
        async move {
            match self {
                Self::Leaf { predicate, .. } => leaf.check(predicate).await,
                Self::And(operands) => {
                    for operand in operands {
                        let verdict = operand.evaluate_with(leaf).await?;
                        if !verdict.satisfied {
                            return Ok(verdict);
                        }
                    }
                    Ok(Verdict::satisfied())
                }
                Self::Or(operands) => {
                    let mut last = Verdict::unsatisfied("no alternatives to satisfy");
                    for operand in operands {
                        let verdict = operand.evaluate_with(leaf).await?;
                        if verdict.satisfied {
                            return Ok(verdict);
                        }
                        last = verdict;
                    }
                    Ok(last)
                }
                Self::Not(inner) => {
                    let verdict = inner.evaluate_with(leaf).await?;
                    if verdict.satisfied {
                        Ok(Verdict::unsatisfied(format!("expected not {inner}, but it was")))
                    } else {
                        Ok(Verdict::satisfied())
                    }
                }
            }
        }
        .boxed()
    }
}

// =============================================================================
// ELEMENT PREDICATES
// =============================================================================

/// What an element condition checks
#[derive(Debug, Clone)]
pub enum ElementPredicate {
    /// Element is in the DOM
    Present,
    /// Element is rendered
    Visible,
    /// Element accepts input
    Enabled,
    /// Element has keyboard focus
    Focused,
    /// Rendered text contains the value
    Text(String),
    /// Rendered text equals the value (after trimming)
    ExactText(String),
    /// Rendered text matches the pattern
    MatchingText(Regex),
    /// Attribute exists, and equals `value` when given
    Attribute {
        /// Attribute name
        name: String,
        /// Expected value
        value: Option<String>,
    },
    /// `class` attribute contains the class
    CssClass(String),
    /// Form value equals the value
    Value(String),
}

impl ElementPredicate {
    /// Check against a resolved or missing element
    pub async fn check<D: Driver>(
        &self,
        driver: &D,
        target: Target<'_, D::Element>,
    ) -> SelenideResult<Verdict> {
        let element = match target {
            Target::Found(element) => element,
            Target::Missing(reason) => return Ok(Verdict::unsatisfied(reason)),
        };
        match self.check_found(driver, element).await {
            Err(e) if e.is_absence() => Ok(Verdict::unsatisfied(e.to_string())),
            other => other,
        }
    }

    async fn check_found<D: Driver>(
        &self,
        driver: &D,
        element: &D::Element,
    ) -> SelenideResult<Verdict> {
        let verdict = match self {
            Self::Present => Verdict::satisfied(),
            Self::Visible => {
                if driver.is_displayed(element).await? {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied("element is not visible")
                }
            }
            Self::Enabled => {
                if driver.is_enabled(element).await? {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied("element is disabled")
                }
            }
            Self::Focused => {
                if driver.is_focused(element).await? {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied("element is not focused")
                }
            }
            Self::Text(expected) => {
                let actual = driver.text(element).await?;
                if actual.contains(expected.as_str()) {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected text containing '{expected}', actual text: '{actual}'"
                    ))
                }
            }
            Self::ExactText(expected) => {
                let actual = driver.text(element).await?;
                if actual.trim() == expected.trim() {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected exact text '{expected}', actual text: '{actual}'"
                    ))
                }
            }
            Self::MatchingText(pattern) => {
                let actual = driver.text(element).await?;
                if pattern.is_match(&actual) {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected text matching '{pattern}', actual text: '{actual}'"
                    ))
                }
            }
            Self::Attribute { name, value } => {
                let actual = driver.attribute(element, name).await?;
                match (value, actual) {
                    (None, Some(_)) => Verdict::satisfied(),
                    (None, None) => {
                        Verdict::unsatisfied(format!("expected attribute {name}, actual: none"))
                    }
                    (Some(expected), Some(actual)) if *expected == actual => Verdict::satisfied(),
                    (Some(expected), actual) => Verdict::unsatisfied(format!(
                        "expected attribute {name}='{expected}', actual: {}",
                        quoted_or_none(actual.as_deref())
                    )),
                }
            }
            Self::CssClass(class) => {
                let classes = driver.attribute(element, "class").await?.unwrap_or_default();
                if classes.split_whitespace().any(|c| c == class) {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected css class '{class}', actual classes: '{classes}'"
                    ))
                }
            }
            Self::Value(expected) => {
                let actual = driver.value(element).await?;
                if actual.as_deref() == Some(expected.as_str()) {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected value '{expected}', actual value: {}",
                        quoted_or_none(actual.as_deref())
                    ))
                }
            }
        };
        Ok(verdict)
    }
}

fn quoted_or_none(value: Option<&str>) -> String {
    value.map_or_else(|| "none".to_string(), |v| format!("'{v}'"))
}

struct ElementLeaf<'d, D: Driver> {
    driver: &'d D,
    target: Target<'d, D::Element>,
}

impl<D: Driver> LeafCheck<ElementPredicate> for ElementLeaf<'_, D> {
    fn check<'a>(&'a self, predicate: &'a ElementPredicate) -> BoxFuture<'a, SelenideResult<Verdict>> {
        predicate.check(self.driver, self.target).boxed()
    }
}

impl Condition<ElementPredicate> {
    /// Evaluate against a resolved or missing element
    pub async fn evaluate<D: Driver>(
        &self,
        driver: &D,
        target: Target<'_, D::Element>,
    ) -> SelenideResult<Verdict> {
        let leaf = ElementLeaf { driver, target };
        self.evaluate_with(&leaf).await
    }
}

// =============================================================================
// COLLECTION PREDICATES
// =============================================================================

/// What a collection condition checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionPredicate {
    /// Exactly `n` elements
    Size(usize),
    /// More than `n` elements
    SizeGreaterThan(usize),
    /// Fewer than `n` elements
    SizeLessThan(usize),
    /// Same size, each text contains the expected one
    Texts(Vec<String>),
    /// Same size, each text equals the expected one
    ExactTexts(Vec<String>),
}

impl CollectionPredicate {
    /// Check against the currently resolved elements
    pub async fn check<D: Driver>(
        &self,
        driver: &D,
        elements: &[D::Element],
    ) -> SelenideResult<Verdict> {
        match self.check_elements(driver, elements).await {
            Err(e) if e.is_absence() => Ok(Verdict::unsatisfied(e.to_string())),
            other => other,
        }
    }

    async fn check_elements<D: Driver>(
        &self,
        driver: &D,
        elements: &[D::Element],
    ) -> SelenideResult<Verdict> {
        let size = elements.len();
        let verdict = match self {
            Self::Size(expected) => size_verdict(size == *expected, "", *expected, size),
            Self::SizeGreaterThan(bound) => size_verdict(size > *bound, "> ", *bound, size),
            Self::SizeLessThan(bound) => size_verdict(size < *bound, "< ", *bound, size),
            Self::Texts(expected) | Self::ExactTexts(expected) => {
                let exact = matches!(self, Self::ExactTexts(_));
                let mut actual = Vec::with_capacity(size);
                for element in elements {
                    actual.push(driver.text(element).await?);
                }
                let matches = actual.len() == expected.len()
                    && actual.iter().zip(expected).all(|(a, e)| {
                        if exact {
                            a.trim() == e.trim()
                        } else {
                            a.contains(e.as_str())
                        }
                    });
                if matches {
                    Verdict::satisfied()
                } else {
                    Verdict::unsatisfied(format!(
                        "expected {}texts {expected:?}, actual texts: {actual:?}",
                        if exact { "exact " } else { "" }
                    ))
                }
            }
        };
        Ok(verdict)
    }
}

fn size_verdict(holds: bool, op: &str, expected: usize, actual: usize) -> Verdict {
    if holds {
        Verdict::satisfied()
    } else {
        Verdict::unsatisfied(format!("expected size {op}{expected}, actual size: {actual}"))
    }
}

struct CollectionLeaf<'d, D: Driver> {
    driver: &'d D,
    elements: &'d [D::Element],
}

impl<D: Driver> LeafCheck<CollectionPredicate> for CollectionLeaf<'_, D> {
    fn check<'a>(
        &'a self,
        predicate: &'a CollectionPredicate,
    ) -> BoxFuture<'a, SelenideResult<Verdict>> {
        predicate.check(self.driver, self.elements).boxed()
    }
}

impl Condition<CollectionPredicate> {
    /// Evaluate against the currently resolved elements
    pub async fn evaluate<D: Driver>(
        &self,
        driver: &D,
        elements: &[D::Element],
    ) -> SelenideResult<Verdict> {
        let leaf = CollectionLeaf { driver, elements };
        self.evaluate_with(&leaf).await
    }
}
