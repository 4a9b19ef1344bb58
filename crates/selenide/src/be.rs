//! State conditions: `element.should(be::visible())`.

use crate::condition::{CollectionCondition, CollectionPredicate, Condition, ElementCondition, ElementPredicate};

/// Element is in the DOM
#[must_use]
pub fn present() -> ElementCondition {
    Condition::leaf(ElementPredicate::Present, "present")
}

/// Element is not in the DOM
#[must_use]
pub fn absent() -> ElementCondition {
    !present()
}

/// Element is rendered
#[must_use]
pub fn visible() -> ElementCondition {
    Condition::leaf(ElementPredicate::Visible, "visible")
}

/// Element is not rendered or not in the DOM
#[must_use]
pub fn hidden() -> ElementCondition {
    !visible()
}

/// Element accepts input
#[must_use]
pub fn enabled() -> ElementCondition {
    Condition::leaf(ElementPredicate::Enabled, "enabled")
}

/// Element is present and does not accept input
#[must_use]
pub fn disabled() -> ElementCondition {
    present().and(!enabled())
}

/// Element has keyboard focus
#[must_use]
pub fn focused() -> ElementCondition {
    Condition::leaf(ElementPredicate::Focused, "focused")
}

/// Collection has no elements
#[must_use]
pub fn empty() -> CollectionCondition {
    Condition::leaf(CollectionPredicate::Size(0), "empty")
}
