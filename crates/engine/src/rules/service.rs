//! Account-domain rules: password strength, username and slug shapes.

use super::Rule;
use crate::value::FieldKind;
use std::collections::BTreeMap;

/// Symbols accepted by the password rule's symbol class.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Password strength policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Minimum length in code points.
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

/// Username shape policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernamePolicy {
    /// Minimum length, inclusive.
    pub min_length: usize,
    /// Maximum length, inclusive.
    pub max_length: usize,
}

impl Default for UsernamePolicy {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 30,
        }
    }
}

/// Inputs for seeding a standard registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulePolicies {
    /// Password policy.
    pub password: PasswordPolicy,
    /// Username policy.
    pub username: UsernamePolicy,
    /// Message template overrides keyed by rule name.
    pub messages: BTreeMap<String, String>,
}

/// Returns true when `password` meets `policy`.
///
/// Length is checked before any character is classified; the four classes
/// are then collected in a single pass.
#[must_use]
pub fn is_strong_password(password: &str, policy: &PasswordPolicy) -> bool {
    if password.chars().count() < policy.min_length {
        return false;
    }

    let (mut upper, mut lower, mut digit, mut symbol) = (false, false, false, false);
    for c in password.chars() {
        match c {
            'A'..='Z' => upper = true,
            'a'..='z' => lower = true,
            '0'..='9' => digit = true,
            _ if PASSWORD_SYMBOLS.contains(c) => symbol = true,
            _ => {},
        }
    }
    upper && lower && digit && symbol
}

/// Returns true when `username` has an allowed length and alphabet.
#[must_use]
pub fn is_valid_username(username: &str, policy: &UsernamePolicy) -> bool {
    let len = username.chars().count();
    (policy.min_length..=policy.max_length).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Returns true for non-empty lowercase slugs without edge hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-')
}

/// `password` rule bound to `policy`.
#[must_use]
pub fn password_rule(policy: &PasswordPolicy) -> Rule {
    let template = format!(
        "{{field}} must be at least {} characters and contain uppercase, lowercase, number, and special character",
        policy.min_length
    );
    let policy = policy.clone();
    Rule::new("password", move |input| {
        input
            .value
            .as_text()
            .is_some_and(|text| is_strong_password(text, &policy))
    })
    .applies_to(&[FieldKind::Text])
    .message(template)
}

/// `username` rule bound to `policy`.
#[must_use]
pub fn username_rule(policy: &UsernamePolicy) -> Rule {
    let template = format!(
        "{{field}} must be {}-{} characters, alphanumeric with optional underscores and hyphens",
        policy.min_length, policy.max_length
    );
    let policy = policy.clone();
    Rule::new("username", move |input| {
        input
            .value
            .as_text()
            .is_some_and(|text| is_valid_username(text, &policy))
    })
    .applies_to(&[FieldKind::Text])
    .message(template)
}

/// `slug` rule.
#[must_use]
pub fn slug_rule() -> Rule {
    Rule::new("slug", |input| input.value.as_text().is_some_and(is_valid_slug))
        .applies_to(&[FieldKind::Text])
        .message("{field} must contain only lowercase letters, numbers, and hyphens")
}

/// Service rules in registration order.
#[must_use]
pub fn service_rules(policies: &RulePolicies) -> Vec<Rule> {
    vec![
        password_rule(&policies.password),
        username_rule(&policies.username),
        slug_rule(),
    ]
}
