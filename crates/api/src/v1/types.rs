//! API v1 envelope types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status for payloads that could not be parsed or bound.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Status for payloads that parsed but broke one or more rules.
pub const STATUS_UNPROCESSABLE_ENTITY: u16 = 422;
/// Status for validation that could not run at all.
pub const STATUS_INTERNAL_SERVER_ERROR: u16 = 500;

/// `error` value of every validation failure envelope.
pub const VALIDATION_FAILED: &str = "Validation failed";

/// Detail key used when a failure is not attributable to one field.
pub const GENERAL_DETAIL_KEY: &str = "general";

/// Field name → message map carried in `details`.
pub type ErrorDetails = BTreeMap<String, String>;

/// Wire envelope returned to callers for rejected requests.
///
/// ```json
/// {"error":"Validation failed","message":"Request body validation failed",
///  "details":{"confirmPassword":"confirmPassword must match password"},"status":422}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelopeDto {
    /// Short category (e.g. `Validation failed`).
    pub error: String,
    /// Human-readable summary naming the request part.
    pub message: String,
    /// Per-field messages keyed by external field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
    /// HTTP status code.
    pub status: u16,
}

impl ErrorEnvelopeDto {
    /// Message for `field`, when present.
    #[must_use]
    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get(field))
            .map(String::as_str)
    }

    /// Returns true when `details` carries an entry for `field`.
    #[must_use]
    pub fn has_field_error(&self, field: &str) -> bool {
        self.field_error(field).is_some()
    }
}

/// Part of a request a guard validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValidationTarget {
    /// JSON body.
    Body,
    /// Query string.
    Query,
    /// Route parameters.
    Params,
    /// Request headers.
    Headers,
    /// Caller-supplied check.
    Custom,
}

impl ValidationTarget {
    /// Every target, in request order.
    pub const ALL: [Self; 5] = [
        Self::Body,
        Self::Query,
        Self::Params,
        Self::Headers,
        Self::Custom,
    ];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Query => "query",
            Self::Params => "params",
            Self::Headers => "headers",
            Self::Custom => "custom",
        }
    }

    /// Parse a target name.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_str().eq_ignore_ascii_case(input.trim()))
    }

    /// `message` of a validation failure envelope.
    #[must_use]
    pub const fn validation_message(self) -> &'static str {
        match self {
            Self::Body => "Request body validation failed",
            Self::Query => "Query parameter validation failed",
            Self::Params => "Route parameter validation failed",
            Self::Headers => "Header validation failed",
            Self::Custom => "Custom validation failed",
        }
    }

    /// `error` of a parse failure envelope.
    #[must_use]
    pub const fn parse_error(self) -> &'static str {
        match self {
            Self::Body => "Invalid request body",
            Self::Query => "Invalid query parameters",
            Self::Params => "Invalid route parameters",
            Self::Headers => "Invalid headers",
            Self::Custom => "Invalid request",
        }
    }

    /// `message` of a parse failure envelope.
    #[must_use]
    pub const fn parse_message(self) -> &'static str {
        match self {
            Self::Body => "Failed to parse request body",
            Self::Query => "Failed to parse query parameters",
            Self::Params => "Failed to parse route parameters",
            Self::Headers => "Failed to parse headers",
            Self::Custom => "Failed to parse request",
        }
    }
}

impl fmt::Display for ValidationTarget {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
