//! Error reporter: renders verdicts and binding failures as envelopes.

use crate::v1::{
    ErrorEnvelopeBuilder, ErrorEnvelopeDto, GENERAL_DETAIL_KEY, STATUS_BAD_REQUEST,
    STATUS_INTERNAL_SERVER_ERROR, VALIDATION_FAILED, ValidationTarget,
};
use payload_guard_engine::{BindError, FieldErrors, Verdict};

/// Render a verdict. Valid verdicts produce no envelope.
#[must_use]
pub fn format_verdict(verdict: &Verdict, target: ValidationTarget) -> Option<ErrorEnvelopeDto> {
    verdict
        .errors()
        .map(|errors| format_field_errors(errors, target))
}

/// Render field failures as a 422 envelope naming `target`.
#[must_use]
pub fn format_field_errors(errors: &FieldErrors, target: ValidationTarget) -> ErrorEnvelopeDto {
    ErrorEnvelopeBuilder::new()
        .with_error(VALIDATION_FAILED)
        .with_message(target.validation_message())
        .with_field_errors(errors)
        .build()
}

/// Render a binding failure as a 400 envelope.
///
/// Field-specific failures are keyed by the external field name, payload
/// failures by `general`.
#[must_use]
pub fn format_bind_error(error: &BindError, target: ValidationTarget) -> ErrorEnvelopeDto {
    ErrorEnvelopeBuilder::new()
        .with_error(target.parse_error())
        .with_message(target.parse_message())
        .with_status(STATUS_BAD_REQUEST)
        .with_field_error(error.field().unwrap_or(GENERAL_DETAIL_KEY), error.reason())
        .build()
}

/// Render a configuration error reaching request time as a 500 envelope.
///
/// Nothing about the rule table is exposed; callers log the
/// [`ConfigurationError`](payload_guard_engine::ConfigurationError) themselves.
#[must_use]
pub fn format_configuration_error() -> ErrorEnvelopeDto {
    ErrorEnvelopeBuilder::new()
        .with_error("Internal Server Error")
        .with_message("An unexpected error occurred")
        .with_status(STATUS_INTERNAL_SERVER_ERROR)
        .build()
}

/// Returns true when `envelope` carries a message for `field`.
#[must_use]
pub fn has_field_error(envelope: &ErrorEnvelopeDto, field: &str) -> bool {
    envelope.has_field_error(field)
}

/// Message for `field`, when present.
#[must_use]
pub fn field_error<'a>(envelope: &'a ErrorEnvelopeDto, field: &str) -> Option<&'a str> {
    envelope.field_error(field)
}

/// One line: `field: message` pairs in key order joined by `; `, or the
/// envelope message when there are no details.
#[must_use]
pub fn summarize(envelope: &ErrorEnvelopeDto) -> String {
    match &envelope.details {
        Some(details) if !details.is_empty() => details
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect::<Vec<_>>()
            .join("; "),
        _ => envelope.message.clone(),
    }
}
