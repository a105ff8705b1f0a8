//! Built-in rule set.

use super::{ParamKind, Rule, RuleInput};
use crate::value::{FieldKind, FieldValue, Number};
use std::cmp::Ordering;

const SIZED_OR_NUMERIC: &[FieldKind] = &[
    FieldKind::Text,
    FieldKind::List,
    FieldKind::Integer,
    FieldKind::Float,
];
const TEXT: &[FieldKind] = &[FieldKind::Text];
const NUMERIC: &[FieldKind] = &[FieldKind::Integer, FieldKind::Float];

/// All built-in rules, in registration order.
#[must_use]
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new("required", |input| !input.value.is_empty()).message("{field} is required"),
        bound_rule("min", "{field} must be at least {param}{unit}", Ordering::is_ge),
        bound_rule("max", "{field} must be at most {param}{unit}", Ordering::is_le),
        bound_rule("len", "{field} must be exactly {param}{unit}", Ordering::is_eq),
        bound_rule("gt", "{field} must be greater than {param}", Ordering::is_gt),
        bound_rule(
            "gte",
            "{field} must be greater than or equal to {param}",
            Ordering::is_ge,
        ),
        bound_rule("lt", "{field} must be less than {param}", Ordering::is_lt),
        bound_rule(
            "lte",
            "{field} must be less than or equal to {param}",
            Ordering::is_le,
        ),
        text_rule("alpha", "{field} must contain only letters", is_alpha),
        text_rule(
            "alphanum",
            "{field} must contain only letters and numbers",
            is_alphanumeric,
        ),
        Rule::new("numeric", |input| match input.value {
            FieldValue::Text(text) => is_numeric(text),
            FieldValue::Integer(_) | FieldValue::Float(_) => true,
            _ => false,
        })
        .applies_to(&[FieldKind::Text, FieldKind::Integer, FieldKind::Float])
        .message("{field} must contain only numbers"),
        text_rule("uuid", "{field} must be a valid UUID", is_uuid),
        text_rule("url", "{field} must be a valid URL", is_url),
        text_rule("email", "{field} must be a valid email address", is_email),
        Rule::new("one_of", one_of)
            .applies_to(&[FieldKind::Text, FieldKind::Integer])
            .param(ParamKind::Words)
            .message("{field} must be one of: {param}"),
        field_rule("eq_field", "{field} must match {param}", |value, other| {
            value.same_as(other)
        }),
        field_rule("ne_field", "{field} must not match {param}", |value, other| {
            !value.same_as(other)
        }),
        ordered_field_rule("gt_field", "{field} must be greater than {param}", Ordering::is_gt),
        ordered_field_rule(
            "gte_field",
            "{field} must be greater than or equal to {param}",
            Ordering::is_ge,
        ),
        ordered_field_rule("lt_field", "{field} must be less than {param}", Ordering::is_lt),
        ordered_field_rule(
            "lte_field",
            "{field} must be less than or equal to {param}",
            Ordering::is_le,
        ),
    ]
}

fn bound_rule(name: &str, template: &str, accept: fn(Ordering) -> bool) -> Rule {
    Rule::new(name, move |input| {
        let (Some(measured), Some(bound)) = (input.value.measure(), input.param.number()) else {
            return false;
        };
        measured.compare(bound).is_some_and(accept)
    })
    .applies_to(SIZED_OR_NUMERIC)
    .param(ParamKind::Bound)
    .message(template)
}

fn text_rule(name: &str, template: &str, accept: fn(&str) -> bool) -> Rule {
    Rule::new(name, move |input| input.value.as_text().is_some_and(accept))
        .applies_to(TEXT)
        .message(template)
}

fn field_rule(
    name: &str,
    template: &str,
    accept: fn(&FieldValue<'_>, &FieldValue<'_>) -> bool,
) -> Rule {
    Rule::new(name, move |input| {
        input
            .param
            .referenced(input.object)
            .is_some_and(|other| accept(&input.value, &other))
    })
    .param(ParamKind::Field)
    .message(template)
}

fn ordered_field_rule(name: &str, template: &str, accept: fn(Ordering) -> bool) -> Rule {
    Rule::new(name, move |input| {
        let other = input
            .param
            .referenced(input.object)
            .and_then(|value| value.as_number());
        match (input.value.as_number(), other) {
            (Some(left), Some(right)) => left.compare(right).is_some_and(accept),
            _ => false,
        }
    })
    .applies_to(NUMERIC)
    .param(ParamKind::OrderedField)
    .message(template)
}

fn one_of(input: &RuleInput<'_>) -> bool {
    let words = input.param.words();
    match input.value {
        FieldValue::Text(text) => words.iter().any(|word| **word == *text),
        FieldValue::Integer(value) => words
            .iter()
            .any(|word| Number::parse(word) == Some(Number::Int(value))),
        _ => false,
    }
}

/// Non-empty and ASCII letters only.
#[must_use]
pub fn is_alpha(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic())
}

/// Non-empty and ASCII letters or digits only.
#[must_use]
pub fn is_alphanumeric(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Optional sign, digits, optional fractional part.
#[must_use]
pub fn is_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.is_none_or(digits)
}

/// Hyphenated UUID (`8-4-4-4-12` hex digits).
#[must_use]
pub fn is_uuid(text: &str) -> bool {
    text.len() == 36 && text.as_bytes().get(8) == Some(&b'-') && uuid::Uuid::try_parse(text).is_ok()
}

/// Absolute URL with a scheme and a host.
#[must_use]
pub fn is_url(text: &str) -> bool {
    url::Url::parse(text).is_ok_and(|parsed| parsed.has_host())
}

/// Structural address check: one `@`, a non-empty local part, and a dotted
/// domain without empty labels or whitespace.
#[must_use]
pub fn is_email(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return false;
    }
    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}
