//! API v1 envelope DTOs and helpers.

mod builder;
mod mappers;
mod reporter;
mod schema;
mod types;

pub use builder::ErrorEnvelopeBuilder;
pub use mappers::{error_envelope_to_dto, status_for_envelope};
pub use reporter::{
    field_error, format_bind_error, format_configuration_error, format_field_errors,
    format_verdict, has_field_error, summarize,
};
pub use schema::error_envelope_schema;
pub use types::*;
