//! Fluent construction of [`ErrorEnvelopeDto`] values.

use crate::v1::{
    ErrorDetails, ErrorEnvelopeDto, STATUS_UNPROCESSABLE_ENTITY, VALIDATION_FAILED,
};
use payload_guard_engine::FieldErrors;

/// Builder for error envelopes.
///
/// Starts from a generic 422 validation failure; every `with_*` call
/// replaces one part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEnvelopeBuilder {
    envelope: ErrorEnvelopeDto,
}

impl Default for ErrorEnvelopeBuilder {
    fn default() -> Self {
        Self {
            envelope: ErrorEnvelopeDto {
                error: VALIDATION_FAILED.to_owned(),
                message: "Request validation failed".to_owned(),
                details: None,
                status: STATUS_UNPROCESSABLE_ENTITY,
            },
        }
    }
}

impl ErrorEnvelopeBuilder {
    /// Builder with the default 422 envelope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `error`.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.envelope.error = error.into();
        self
    }

    /// Set `message`.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.envelope.message = message.into();
        self
    }

    /// Set `status`.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.envelope.status = status;
        self
    }

    /// Replace `details`.
    #[must_use]
    pub fn with_details(mut self, details: ErrorDetails) -> Self {
        self.envelope.details = Some(details);
        self
    }

    /// Add one detail entry, keeping any already present.
    #[must_use]
    pub fn with_field_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.envelope
            .details
            .get_or_insert_with(ErrorDetails::new)
            .insert(field.into(), message.into());
        self
    }

    /// Replace `details` with one message per failing field.
    #[must_use]
    pub fn with_field_errors(self, errors: &FieldErrors) -> Self {
        self.with_details(errors.messages())
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> ErrorEnvelopeDto {
        self.envelope
    }
}
