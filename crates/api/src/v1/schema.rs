//! JSON Schema export for the wire envelope.

use crate::v1::ErrorEnvelopeDto;
use schemars::{Schema, schema_for};

/// JSON Schema for `ErrorEnvelopeDto`.
#[must_use]
pub fn error_envelope_schema() -> Schema {
    schema_for!(ErrorEnvelopeDto)
}
