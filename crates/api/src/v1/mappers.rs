//! Mapping shared `ErrorEnvelope`s onto the wire envelope.

use crate::v1::{
    ErrorDetails, ErrorEnvelopeBuilder, ErrorEnvelopeDto, GENERAL_DETAIL_KEY, STATUS_BAD_REQUEST,
    STATUS_INTERNAL_SERVER_ERROR, STATUS_UNPROCESSABLE_ENTITY, VALIDATION_FAILED,
    ValidationTarget,
};
use payload_guard_shared::{ErrorCode, ErrorEnvelope, ErrorKind};

/// HTTP status for an envelope.
///
/// Validation failures are 422, every other expected error is 400, and
/// invariant or unexpected errors are 500.
#[must_use]
pub fn status_for_envelope(envelope: &ErrorEnvelope) -> u16 {
    match envelope.kind {
        ErrorKind::Expected if envelope.code == ErrorCode::validation_failed() => {
            STATUS_UNPROCESSABLE_ENTITY
        },
        ErrorKind::Expected => STATUS_BAD_REQUEST,
        ErrorKind::Invariant | ErrorKind::Unexpected => STATUS_INTERNAL_SERVER_ERROR,
    }
}

/// Map an `ErrorEnvelope` produced while handling `target` into the wire
/// envelope.
///
/// Metadata is only forwarded for validation and parse failures, where it
/// holds caller-facing messages; server-side errors expose nothing.
#[must_use]
pub fn error_envelope_to_dto(envelope: &ErrorEnvelope, target: ValidationTarget) -> ErrorEnvelopeDto {
    let status = status_for_envelope(envelope);
    match status {
        STATUS_UNPROCESSABLE_ENTITY => ErrorEnvelopeBuilder::new()
            .with_error(VALIDATION_FAILED)
            .with_message(target.validation_message())
            .with_details(envelope.metadata.clone())
            .build(),
        STATUS_BAD_REQUEST if envelope.code == ErrorCode::parse_failed() => {
            ErrorEnvelopeBuilder::new()
                .with_error(target.parse_error())
                .with_message(target.parse_message())
                .with_status(status)
                .with_details(parse_details(envelope))
                .build()
        },
        STATUS_BAD_REQUEST => ErrorEnvelopeBuilder::new()
            .with_error("Bad Request")
            .with_message(envelope.message.clone())
            .with_status(status)
            .build(),
        _ => ErrorEnvelopeBuilder::new()
            .with_error("Internal Server Error")
            .with_message("An unexpected error occurred")
            .with_status(status)
            .build(),
    }
}

fn parse_details(envelope: &ErrorEnvelope) -> ErrorDetails {
    let mut details = ErrorDetails::new();
    match envelope.metadata.get("field") {
        Some(field) => {
            let prefix = format!("{field}: ");
            let reason = envelope
                .message
                .strip_prefix(&prefix)
                .unwrap_or(&envelope.message);
            details.insert(field.clone(), reason.to_owned());
        },
        None => {
            details.insert(GENERAL_DETAIL_KEY.to_owned(), envelope.message.clone());
        },
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;
    use payload_guard_engine::{BindError, CheckError, ConfigurationError, FieldErrors, FieldFailure};
    use payload_guard_shared::ErrorClass;

    #[test]
    fn check_failures_map_to_422_details() {
        let mut errors = FieldErrors::new();
        errors.insert("email", FieldFailure::rule("email", "email must be a valid email address"));
        let envelope = ErrorEnvelope::from(CheckError::Invalid(errors));

        let dto = error_envelope_to_dto(&envelope, ValidationTarget::Body);
        assert_eq!(dto.status, 422);
        assert_eq!(dto.message, "Request body validation failed");
        assert_eq!(dto.field_error("email"), Some("email must be a valid email address"));
    }

    #[test]
    fn bind_failures_map_to_400_details() {
        let envelope = ErrorEnvelope::from(BindError::new("page", "must be a valid integer"));

        let dto = error_envelope_to_dto(&envelope, ValidationTarget::Query);
        assert_eq!(dto.status, 400);
        assert_eq!(dto.error, "Invalid query parameters");
        assert_eq!(dto.field_error("page"), Some("must be a valid integer"));
    }

    #[test]
    fn server_side_errors_hide_metadata() {
        let invariant = ErrorEnvelope::from(ConfigurationError::DuplicateRule { name: "min".into() });
        let unexpected = ErrorEnvelope::unexpected(ErrorCode::io(), "disk", ErrorClass::Retriable);

        for envelope in [invariant, unexpected] {
            let dto = error_envelope_to_dto(&envelope, ValidationTarget::Body);
            assert_eq!(dto.status, 500);
            assert_eq!(dto.details, None);
        }
    }

    #[test]
    fn other_expected_errors_are_bad_requests() {
        let envelope = ErrorEnvelope::expected(ErrorCode::invalid_input(), "unknown field `nope`");
        let dto = error_envelope_to_dto(&envelope, ValidationTarget::Body);

        assert_eq!(dto.status, 400);
        assert_eq!(dto.message, "unknown field `nope`");
    }
}
