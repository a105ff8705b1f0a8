//! Rule registry: name → rule, populated once and shared read-only.

use crate::error::ConfigurationError;
use crate::rules::{Rule, RulePolicies, builtin, service};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of named rules.
///
/// Built at startup, then wrapped in an `Arc` and shared. Registration
/// rejects name conflicts instead of overwriting.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<Box<str>, Arc<Rule>>,
}

impl RuleRegistry {
    /// Registry with no rules.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in rule set.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for rule in builtin::builtin_rules() {
            registry.insert_unchecked(rule);
        }
        registry
    }

    /// Built-ins, then the service rules bound to `policies`, then message
    /// overrides. Overrides naming an unregistered rule are rejected.
    pub fn standard(policies: &RulePolicies) -> Result<Self, ConfigurationError> {
        let mut registry = Self::with_builtins();
        for rule in service::service_rules(policies) {
            registry.register(rule)?;
        }
        for (name, template) in &policies.messages {
            registry.override_message(name, template)?;
        }
        tracing::info!(
            rules = registry.len(),
            overrides = policies.messages.len(),
            "rule registry seeded"
        );
        Ok(registry)
    }

    /// Register a rule. Fails when the name is already bound.
    pub fn register(&mut self, rule: Rule) -> Result<(), ConfigurationError> {
        if self.rules.contains_key(rule.name()) {
            return Err(ConfigurationError::DuplicateRule {
                name: rule.name().into(),
            });
        }
        self.insert_unchecked(rule);
        Ok(())
    }

    fn insert_unchecked(&mut self, rule: Rule) {
        self.rules.insert(rule.name().into(), Arc::new(rule));
    }

    fn override_message(&mut self, name: &str, template: &str) -> Result<(), ConfigurationError> {
        let Some(existing) = self.rules.get_mut(name) else {
            return Err(ConfigurationError::UnknownRule {
                rule: name.into(),
                location: "message overrides".into(),
            });
        };
        *existing = Arc::new(Rule::clone(existing.as_ref()).message(template));
        Ok(())
    }

    /// Look up a rule.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<Rule>> {
        self.rules.get(name)
    }

    /// Look up a rule, failing with [`ConfigurationError::UnknownRule`].
    pub fn resolve(&self, name: &str) -> Result<&Arc<Rule>, ConfigurationError> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownRule {
            rule: name.into(),
            location: "registry".into(),
        })
    }

    /// Message template of a rule.
    #[must_use]
    pub fn template(&self, name: &str) -> Option<&str> {
        self.get(name).map(|rule| rule.template().as_str())
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(AsRef::as_ref).collect();
        names.sort_unstable();
        names
    }

    /// Rules sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        let mut rules: Vec<&Rule> = self.rules.values().map(AsRef::as_ref).collect();
        rules.sort_unstable_by(|left, right| left.name().cmp(right.name()));
        rules.into_iter()
    }

    /// Number of registered rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
