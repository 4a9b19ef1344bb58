//! Content conditions: `element.should(have::text("Hello"))`.

use regex::Regex;

use crate::condition::{CollectionCondition, CollectionPredicate, Condition, ElementCondition, ElementPredicate};

/// Rendered text contains `text`
#[must_use]
pub fn text(text: impl Into<String>) -> ElementCondition {
    let text = text.into();
    let description = format!("text '{text}'");
    Condition::leaf(ElementPredicate::Text(text), description)
}

/// Rendered text equals `text`, ignoring surrounding whitespace
#[must_use]
pub fn exact_text(text: impl Into<String>) -> ElementCondition {
    let text = text.into();
    let description = format!("exact text '{text}'");
    Condition::leaf(ElementPredicate::ExactText(text), description)
}

/// Rendered text matches `pattern`
#[must_use]
pub fn matching_text(pattern: Regex) -> ElementCondition {
    let description = format!("text matching '{pattern}'");
    Condition::leaf(ElementPredicate::MatchingText(pattern), description)
}

/// Attribute `name` equals `value`
#[must_use]
pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> ElementCondition {
    let (name, value) = (name.into(), value.into());
    let description = format!("attribute {name}='{value}'");
    Condition::leaf(
        ElementPredicate::Attribute {
            name,
            value: Some(value),
        },
        description,
    )
}

/// Attribute `name` is set
#[must_use]
pub fn attribute_present(name: impl Into<String>) -> ElementCondition {
    let name = name.into();
    let description = format!("attribute {name}");
    Condition::leaf(ElementPredicate::Attribute { name, value: None }, description)
}

/// `class` attribute contains `class`
#[must_use]
pub fn css_class(class: impl Into<String>) -> ElementCondition {
    let class = class.into();
    let description = format!("css class '{class}'");
    Condition::leaf(ElementPredicate::CssClass(class), description)
}

/// Form value equals `value`
#[must_use]
pub fn value(value: impl Into<String>) -> ElementCondition {
    let value = value.into();
    let description = format!("value '{value}'");
    Condition::leaf(ElementPredicate::Value(value), description)
}

/// Collection has exactly `n` elements
#[must_use]
pub fn size(n: usize) -> CollectionCondition {
    Condition::leaf(CollectionPredicate::Size(n), format!("size {n}"))
}

/// Collection has more than `n` elements
#[must_use]
pub fn size_greater_than(n: usize) -> CollectionCondition {
    Condition::leaf(CollectionPredicate::SizeGreaterThan(n), format!("size > {n}"))
}

/// Collection has fewer than `n` elements
#[must_use]
pub fn size_less_than(n: usize) -> CollectionCondition {
    Condition::leaf(CollectionPredicate::SizeLessThan(n), format!("size < {n}"))
}

/// Element texts contain `texts`, in order
#[must_use]
pub fn texts<I, S>(texts: I) -> CollectionCondition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
    let description = format!("texts {texts:?}");
    Condition::leaf(CollectionPredicate::Texts(texts), description)
}

/// Element texts equal `texts`, in order
#[must_use]
pub fn exact_texts<I, S>(texts: I) -> CollectionCondition
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let texts: Vec<String> = texts.into_iter().map(Into::into).collect();
    let description = format!("exact texts {texts:?}");
    Condition::leaf(CollectionPredicate::ExactTexts(texts), description)
}
