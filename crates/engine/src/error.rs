//! Engine error types.

use crate::engine::FieldErrors;
use crate::value::BindError;
use payload_guard_shared::{ErrorCode, ErrorEnvelope};

/// Structure-definition-time failure. Never produced per request for a
/// shape that resolved successfully.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// A rule name was registered twice.
    #[error("rule `{name}` is already registered")]
    DuplicateRule {
        /// Conflicting rule name.
        name: Box<str>,
    },
    /// A rule name is not in the registry.
    #[error("unknown rule `{rule}` referenced by {location}")]
    UnknownRule {
        /// Missing rule name.
        rule: Box<str>,
        /// Where the name was referenced (`Shape.field`, `registry`, ...).
        location: Box<str>,
    },
    /// A rule annotation cannot be evaluated as written.
    #[error("malformed `{rule}` annotation on {location}: {reason}")]
    MalformedAnnotation {
        /// Offending rule name.
        rule: Box<str>,
        /// `Shape.field` location.
        location: Box<str>,
        /// What is wrong with it.
        reason: Box<str>,
    },
}

impl ConfigurationError {
    pub(crate) fn malformed(
        rule: &str,
        location: &str,
        reason: impl Into<Box<str>>,
    ) -> Self {
        Self::MalformedAnnotation {
            rule: rule.into(),
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Stable error code.
    #[must_use]
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateRule { .. } => ErrorCode::new("config", "duplicate_rule"),
            Self::UnknownRule { .. } => ErrorCode::new("config", "unknown_rule"),
            Self::MalformedAnnotation { .. } => ErrorCode::new("config", "malformed_annotation"),
        }
    }
}

impl From<ConfigurationError> for ErrorEnvelope {
    fn from(error: ConfigurationError) -> Self {
        let envelope = Self::invariant(error.error_code(), error.to_string());
        match error {
            ConfigurationError::DuplicateRule { name } => envelope.with_metadata("rule", name),
            ConfigurationError::UnknownRule { rule, location }
            | ConfigurationError::MalformedAnnotation { rule, location, .. } => envelope
                .with_metadata("rule", rule)
                .with_metadata("location", location),
        }
    }
}

/// Failure of [`crate::Validator::check`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    /// The shape could not be resolved.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// One or more fields failed.
    #[error("{0}")]
    Invalid(FieldErrors),
}

impl From<CheckError> for ErrorEnvelope {
    fn from(error: CheckError) -> Self {
        match error {
            CheckError::Configuration(error) => error.into(),
            CheckError::Invalid(errors) => {
                let mut envelope = Self::expected(ErrorCode::validation_failed(), errors.to_string());
                for (field, failure) in errors.iter() {
                    envelope = envelope.with_metadata(field, failure.message());
                }
                envelope
            },
        }
    }
}

impl From<BindError> for ErrorEnvelope {
    fn from(error: BindError) -> Self {
        let envelope = Self::expected(ErrorCode::parse_failed(), error.to_string());
        match error.field() {
            Some(field) => envelope.with_metadata("field", field),
            None => envelope,
        }
    }
}
