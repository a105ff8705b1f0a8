//! Request guard: binds a request part, validates it, and either stores the
//! validated object in the scope or rejects the request.

use crate::request::RequestData;
use crate::scope::{RequestScope, RequestSource};
use payload_guard_api::v1::{
    ErrorEnvelopeDto, GENERAL_DETAIL_KEY, ValidationTarget, format_bind_error, format_configuration_error,
    format_field_errors,
};
use payload_guard_engine::{
    BindError, CheckError, ConfigurationError, DynamicRecord, FieldErrors, FieldKind, FieldLookup,
    FromFieldMap, ResolvedShape, Selection, Shape, ShapeDeclaration, Validated, Validator, Verdict,
};
use payload_guard_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Prefix of the metadata keys that carry envelope details.
pub const DETAIL_METADATA_PREFIX: &str = "details.";

/// Why a request was rejected, with the envelope to send back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The part could not be parsed or bound (400).
    Parse,
    /// The candidate broke one or more rules (422).
    Validation,
    /// The shape could not be resolved (500).
    Configuration,
}

/// A rejected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    kind: RejectionKind,
    envelope: ErrorEnvelopeDto,
}

impl Rejection {
    fn parse(error: &BindError, target: ValidationTarget) -> Self {
        tracing::debug!(
            %target,
            field = error.field().unwrap_or(GENERAL_DETAIL_KEY),
            "request part could not be bound"
        );
        Self {
            kind: RejectionKind::Parse,
            envelope: format_bind_error(error, target),
        }
    }

    fn validation(errors: &FieldErrors, target: ValidationTarget) -> Self {
        tracing::debug!(%target, failed = errors.len(), "request part failed validation");
        Self {
            kind: RejectionKind::Validation,
            envelope: format_field_errors(errors, target),
        }
    }

    fn configuration(error: &ConfigurationError, target: ValidationTarget) -> Self {
        tracing::error!(%target, error = %error, "validation is misconfigured");
        Self {
            kind: RejectionKind::Configuration,
            envelope: format_configuration_error(),
        }
    }

    /// Rejection category.
    #[must_use]
    pub const fn kind(&self) -> RejectionKind {
        self.kind
    }

    /// HTTP status to respond with.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.envelope.status
    }

    /// Envelope to respond with.
    #[must_use]
    pub const fn envelope(&self) -> &ErrorEnvelopeDto {
        &self.envelope
    }

    /// Consume and return the envelope.
    #[must_use]
    pub fn into_envelope(self) -> ErrorEnvelopeDto {
        self.envelope
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{} {}: {}",
            self.envelope.status, self.envelope.error, self.envelope.message
        )
    }
}

impl std::error::Error for Rejection {}

impl From<Rejection> for ErrorEnvelope {
    fn from(rejection: Rejection) -> Self {
        let ErrorEnvelopeDto {
            message,
            details,
            status,
            ..
        } = rejection.envelope;
        let envelope = match rejection.kind {
            RejectionKind::Parse => Self::expected(ErrorCode::parse_failed(), message),
            RejectionKind::Validation => Self::expected(ErrorCode::validation_failed(), message),
            RejectionKind::Configuration => {
                Self::unexpected(ErrorCode::internal(), message, ErrorClass::NonRetriable)
            },
        };
        details
            .unwrap_or_default()
            .into_iter()
            .fold(envelope.with_metadata("status", status.to_string()), |envelope, (field, reason)| {
                envelope.with_metadata(format!("{DETAIL_METADATA_PREFIX}{field}"), reason)
            })
    }
}

/// Validates request parts and records the results in a [`RequestScope`].
#[derive(Debug, Clone)]
pub struct RequestGuard {
    validator: Arc<Validator>,
}

impl RequestGuard {
    /// Guard backed by a shared validator.
    #[must_use]
    pub const fn new(validator: Arc<Validator>) -> Self {
        Self { validator }
    }

    /// Validator used by this guard.
    #[must_use]
    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Resolve `T` ahead of the first request.
    pub fn prepare<T: Shape>(&self) -> Result<(), ConfigurationError> {
        self.validator.prepare::<T>().map(|_| ())
    }

    /// Parse the body as JSON into `T`, validate it, and store it under
    /// `validated_body`.
    ///
    /// Declared fields that are missing or `null` bind as the zero value of
    /// their kind (`Option` fields as `None`), so `required` reports them.
    pub fn validate_body<T>(&self, request: &RequestData, scope: &mut RequestScope) -> Result<(), Rejection>
    where
        T: Shape + DeserializeOwned + Send + Sync,
    {
        let unparseable = |error: serde_json::Error| {
            Rejection::parse(&BindError::payload(error.to_string()), ValidationTarget::Body)
        };
        let mut payload: Value = serde_json::from_slice(request.body()).map_err(unparseable)?;
        fill_absent_fields(&T::declaration(), &mut payload);
        let candidate: T = serde_json::from_value(payload).map_err(unparseable)?;
        self.admit(candidate, RequestSource::Body, scope)
    }

    /// Bind the query string into `T` by external name, validate it, and
    /// store it under `validated_query`.
    pub fn validate_query<T>(&self, request: &RequestData, scope: &mut RequestScope) -> Result<(), Rejection>
    where
        T: Shape + FromFieldMap + Send + Sync,
    {
        self.bind_and_admit::<T>(request.query(), RequestSource::Query, scope)
    }

    /// Bind route parameters into `T`, validate, and store under
    /// `validated_params`.
    pub fn validate_params<T>(&self, request: &RequestData, scope: &mut RequestScope) -> Result<(), Rejection>
    where
        T: Shape + FromFieldMap + Send + Sync,
    {
        self.bind_and_admit::<T>(request.params(), RequestSource::Params, scope)
    }

    /// Bind headers (case-insensitive names) into `T`, validate, and store
    /// under `validated_headers`.
    pub fn validate_headers<T>(&self, request: &RequestData, scope: &mut RequestScope) -> Result<(), Rejection>
    where
        T: Shape + FromFieldMap + Send + Sync,
    {
        self.bind_and_admit::<T>(request.headers(), RequestSource::Headers, scope)
    }

    /// Run a caller-supplied check. Failures are reported as 422 custom
    /// validation failures; nothing is stored.
    pub fn validate_custom<F>(&self, request: &RequestData, check: F) -> Result<(), Rejection>
    where
        F: FnOnce(&RequestData) -> Result<(), FieldErrors>,
    {
        check(request).map_err(|errors| Rejection::validation(&errors, ValidationTarget::Custom))
    }

    /// Bind `source` against a shape resolved at runtime and validate it.
    /// `fields` selects partial validation; empty means every field.
    pub fn validate_dynamic(
        &self,
        shape: &ResolvedShape,
        source: RequestSource,
        request: &RequestData,
        fields: &[&str],
    ) -> Result<DynamicRecord, Rejection> {
        let target = source.target();
        let record = match source {
            RequestSource::Body => {
                let payload: Value = serde_json::from_slice(request.body())
                    .map_err(|error| Rejection::parse(&BindError::payload(error.to_string()), target))?;
                DynamicRecord::from_json(shape, &payload)
            },
            RequestSource::Query => DynamicRecord::from_lookup(shape, request.query()),
            RequestSource::Params => DynamicRecord::from_lookup(shape, request.params()),
            RequestSource::Headers => DynamicRecord::from_lookup(shape, request.headers()),
        }
        .map_err(|error| Rejection::parse(&error, target))?;

        match self
            .validator
            .validate_with(shape, &record, Selection::Only(fields))
        {
            Verdict::Valid => Ok(record),
            Verdict::Invalid(errors) => Err(Rejection::validation(&errors, target)),
        }
    }

    fn bind_and_admit<T>(
        &self,
        lookup: &dyn FieldLookup,
        source: RequestSource,
        scope: &mut RequestScope,
    ) -> Result<(), Rejection>
    where
        T: Shape + FromFieldMap + Send + Sync,
    {
        let candidate =
            T::from_field_map(lookup).map_err(|error| Rejection::parse(&error, source.target()))?;
        self.admit(candidate, source, scope)
    }

    fn admit<T>(&self, candidate: T, source: RequestSource, scope: &mut RequestScope) -> Result<(), Rejection>
    where
        T: Shape + Send + Sync,
    {
        let validated: Validated<T> = self.validator.check(candidate).map_err(|error| match error {
            CheckError::Configuration(error) => Rejection::configuration(&error, source.target()),
            CheckError::Invalid(errors) => Rejection::validation(&errors, source.target()),
        })?;
        scope.insert(source, validated);
        Ok(())
    }
}

fn fill_absent_fields(declaration: &ShapeDeclaration, payload: &mut Value) {
    let Value::Object(object) = payload else {
        return;
    };
    for field in declaration.fields.iter().filter(|field| !field.nullable) {
        let Some(zero) = zero_value(field.kind) else {
            continue;
        };
        let slot = object.entry(field.external_name()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = zero;
        }
    }
}

fn zero_value(kind: FieldKind) -> Option<Value> {
    match kind {
        FieldKind::Text => Some(Value::String(String::new())),
        FieldKind::Integer => Some(Value::from(0)),
        FieldKind::Float => Some(Value::from(0.0)),
        FieldKind::Bool => Some(Value::Bool(false)),
        FieldKind::List => Some(Value::Array(Vec::new())),
        FieldKind::Any => None,
    }
}
