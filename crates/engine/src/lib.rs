//! # payload-guard-engine
//!
//! Declarative validation of request payloads.
//!
//! - [`RuleRegistry`]: named rules, seeded with built-in and service rules
//! - [`annotation::resolve`]: turns a declared shape into rule bindings,
//!   rejecting unknown rules and malformed parameters up front
//! - [`Validator`]: full and partial validation with one message per field
//!
//! Shapes are declared with `#[derive(Validate)]`:
//!
//! ```
//! use payload_guard_engine::{RuleRegistry, RulePolicies, Validate, Validator};
//!
//! #[derive(Validate)]
//! struct Signup {
//!     #[validate(required, username)]
//!     username: String,
//!     #[validate(required, password)]
//!     password: String,
//!     #[validate(field = "confirmPassword", required, eq_field = "password")]
//!     confirm_password: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new(RuleRegistry::standard(&RulePolicies::default())?);
//! let verdict = validator.validate(&Signup {
//!     username: "test_user-1".into(),
//!     password: "Abc12345!".into(),
//!     confirm_password: "different".into(),
//! })?;
//!
//! let errors = verdict.errors().ok_or("expected failures")?;
//! assert!(errors.contains("confirmPassword"));
//! assert!(!errors.contains("password"));
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

extern crate self as payload_guard_engine;

pub mod annotation;
pub mod cache;
pub mod engine;
pub mod error;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod shape;
pub mod value;

pub use annotation::{BoundRule, FieldAnnotation, ResolvedShape};
pub use engine::{
    FIELD_NOT_FOUND, FailureKind, FieldErrors, FieldFailure, Selection, Validator, Verdict,
};
pub use error::{CheckError, ConfigurationError};
pub use payload_guard_shared::Validated;
pub use payload_guard_validate_derive::Validate;
pub use registry::RuleRegistry;
pub use rules::{MessageTemplate, ParamKind, PasswordPolicy, Rule, RuleInput, RuleParam, RulePolicies, UsernamePolicy};
pub use schema::{DynamicRecord, SchemaDocument, SchemaField};
pub use shape::{FieldDeclaration, FieldSource, RuleSpec, Shape, ShapeDeclaration};
pub use value::{
    BindError, FieldKind, FieldLookup, FieldValue, FromFieldMap, FromFieldText, Number, ToFieldValue,
};
