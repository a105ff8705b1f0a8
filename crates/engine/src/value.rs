//! Field values as seen by rule predicates, and text binding for
//! string-keyed request sources.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Coarse type of a declared field.
///
/// Rules declare the kinds they apply to; the resolver rejects a rule whose
/// kind set does not contain the field's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// UTF-8 text.
    Text,
    /// Signed or unsigned integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// Sequence of items (only its length is observable).
    List,
    /// Unknown at declaration time; kind checks are skipped.
    Any,
}

impl FieldKind {
    /// Returns true for integer and float kinds.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Returns true for kinds measured by length (text and lists).
    #[must_use]
    pub const fn is_sized(self) -> bool {
        matches!(self, Self::Text | Self::List)
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Any => "any",
        }
    }

    /// Unit suffix used when rendering length-based messages.
    #[must_use]
    pub const fn unit_suffix(self) -> &'static str {
        match self {
            Self::Text => " characters",
            Self::List => " items",
            Self::Integer | Self::Float | Self::Bool | Self::Any => "",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Numeric value with integer precision preserved where possible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Exact integer.
    Int(i128),
    /// Floating point value (always finite when produced by the resolver).
    Float(f64),
}

impl Number {
    /// Parse a rule parameter: integers first, then finite floats.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<i128>() {
            return Some(Self::Int(value));
        }
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Self::Float)
    }

    /// Lossy float view.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "mixed int/float comparisons are defined over f64"
    )]
    pub const fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float(value) => value,
        }
    }

    /// Returns the integer value when this is a non-negative integer.
    #[must_use]
    pub fn as_length(self) -> Option<usize> {
        match self {
            Self::Int(value) => usize::try_from(value).ok(),
            Self::Float(_) => None,
        }
    }

    /// Compare two numbers; integers compare exactly, mixed pairs as `f64`.
    #[must_use]
    pub fn compare(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(left), Self::Int(right)) => Some(left.cmp(&right)),
            (left, right) => left.as_f64().partial_cmp(&right.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(formatter, "{value}"),
            Self::Float(value) => write!(formatter, "{value}"),
        }
    }
}

/// Borrowed view of a single field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// Missing value (`None`, absent key, JSON `null`).
    Absent,
    /// Text value.
    Text(&'a str),
    /// Integer value.
    Integer(i128),
    /// Float value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// List value, observed through its length.
    List(usize),
}

impl FieldValue<'_> {
    /// Returns true when the value equals its kind's zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(value) => value.is_empty(),
            Self::Integer(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            Self::Bool(value) => !*value,
            Self::List(len) => *len == 0,
        }
    }

    /// Text content, if this is a text value.
    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric content, if this is an integer or float value.
    #[must_use]
    pub const fn as_number(&self) -> Option<Number> {
        match self {
            Self::Integer(value) => Some(Number::Int(*value)),
            Self::Float(value) => Some(Number::Float(*value)),
            _ => None,
        }
    }

    /// Size used by bound rules: code points for text, item count for
    /// lists, the value itself for numbers.
    #[must_use]
    pub fn measure(&self) -> Option<Number> {
        match self {
            Self::Text(value) => Some(length_number(value.chars().count())),
            Self::List(len) => Some(length_number(*len)),
            Self::Integer(_) | Self::Float(_) => self.as_number(),
            Self::Absent | Self::Bool(_) => None,
        }
    }

    /// Equality used by cross-field rules (numbers compare across int/float).
    #[must_use]
    pub fn same_as(&self, other: &FieldValue<'_>) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(left), Some(right)) => left.compare(right) == Some(Ordering::Equal),
            _ => match (self, other) {
                (FieldValue::Text(left), FieldValue::Text(right)) => left == right,
                (FieldValue::Bool(left), FieldValue::Bool(right)) => left == right,
                (FieldValue::List(left), FieldValue::List(right)) => left == right,
                (FieldValue::Absent, FieldValue::Absent) => true,
                _ => false,
            },
        }
    }
}

fn length_number(len: usize) -> Number {
    Number::Int(i128::try_from(len).unwrap_or(i128::MAX))
}

/// Conversion from a struct field into a [`FieldValue`].
///
/// Implemented for the primitive types the derive macro supports; fields of
/// other types must be marked `#[validate(skip)]`.
pub trait ToFieldValue {
    /// Kind reported to the resolver.
    const KIND: FieldKind;

    /// True when the type has its own "no value" state (`Option`).
    const NULLABLE: bool = false;

    /// Borrow the value for rule evaluation.
    fn to_field_value(&self) -> FieldValue<'_>;
}

impl ToFieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl ToFieldValue for str {
    const KIND: FieldKind = FieldKind::Text;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl ToFieldValue for Box<str> {
    const KIND: FieldKind = FieldKind::Text;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Text(self)
    }
}

impl ToFieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Bool(*self)
    }
}

impl ToFieldValue for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Float(f64::from(*self))
    }
}

impl ToFieldValue for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Float(*self)
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToFieldValue for $ty {
                const KIND: FieldKind = FieldKind::Integer;

                fn to_field_value(&self) -> FieldValue<'_> {
                    FieldValue::Integer(i128::from(*self))
                }
            }
        )*
    };
}

integer_field_value!(i8, i16, i32, i64, i128, u8, u16, u32, u64);

impl ToFieldValue for usize {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Integer(i128::try_from(*self).unwrap_or(i128::MAX))
    }
}

impl ToFieldValue for isize {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::Integer(i128::try_from(*self).unwrap_or(i128::MAX))
    }
}

impl<T: ToFieldValue> ToFieldValue for Option<T> {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = true;

    fn to_field_value(&self) -> FieldValue<'_> {
        self.as_ref()
            .map_or(FieldValue::Absent, ToFieldValue::to_field_value)
    }
}

impl<T> ToFieldValue for Vec<T> {
    const KIND: FieldKind = FieldKind::List;

    fn to_field_value(&self) -> FieldValue<'_> {
        FieldValue::List(self.len())
    }
}

impl<T: ToFieldValue + ?Sized> ToFieldValue for &T {
    const KIND: FieldKind = T::KIND;
    const NULLABLE: bool = T::NULLABLE;

    fn to_field_value(&self) -> FieldValue<'_> {
        (**self).to_field_value()
    }
}

/// Failure to build a candidate object from raw request data.
///
/// This is a parse-class failure: it is reported before validation runs and
/// never reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    field: Option<Box<str>>,
    reason: Box<str>,
}

impl BindError {
    /// Failure attributed to one external field name.
    pub fn new(field: impl Into<Box<str>>, reason: impl Into<Box<str>>) -> Self {
        Self {
            field: Some(field.into()),
            reason: reason.into(),
        }
    }

    /// Failure of the payload as a whole (e.g. malformed JSON).
    pub fn payload(reason: impl Into<Box<str>>) -> Self {
        Self {
            field: None,
            reason: reason.into(),
        }
    }

    /// External field name, when the failure is field-specific.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(formatter, "{field}: {}", self.reason),
            None => formatter.write_str(&self.reason),
        }
    }
}

impl std::error::Error for BindError {}

/// Parse one field from its textual form (query strings, route params,
/// headers).
pub trait FromFieldText: Sized {
    /// Parse a present value.
    fn from_field_text(raw: &str) -> Result<Self, String>;

    /// Value used when the key is absent; the zero value of the type so that
    /// `required` reports the omission.
    fn empty() -> Self;
}

impl FromFieldText for String {
    fn from_field_text(raw: &str) -> Result<Self, String> {
        Ok(raw.to_owned())
    }

    fn empty() -> Self {
        Self::new()
    }
}

impl FromFieldText for Box<str> {
    fn from_field_text(raw: &str) -> Result<Self, String> {
        Ok(raw.into())
    }

    fn empty() -> Self {
        Self::default()
    }
}

impl FromFieldText for bool {
    fn from_field_text(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err("must be a boolean".to_owned()),
        }
    }

    fn empty() -> Self {
        false
    }
}

macro_rules! number_from_field_text {
    ($reason:literal => $($ty:ty),* $(,)?) => {
        $(
            impl FromFieldText for $ty {
                fn from_field_text(raw: &str) -> Result<Self, String> {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        return Ok(Self::default());
                    }
                    trimmed.parse::<$ty>().map_err(|_| $reason.to_owned())
                }

                fn empty() -> Self {
                    Self::default()
                }
            }
        )*
    };
}

number_from_field_text!("must be a valid integer" => i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);
number_from_field_text!("must be a valid number" => f32, f64);

impl<T: FromFieldText> FromFieldText for Option<T> {
    fn from_field_text(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Ok(None);
        }
        T::from_field_text(raw).map(Some)
    }

    fn empty() -> Self {
        None
    }
}

impl<T: FromFieldText> FromFieldText for Vec<T> {
    fn from_field_text(raw: &str) -> Result<Self, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(T::from_field_text)
            .collect()
    }

    fn empty() -> Self {
        Self::new()
    }
}

/// Lookup of raw values by external field name.
pub trait FieldLookup {
    /// Raw value for `name`, if present.
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl FieldLookup for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

impl<S: std::hash::BuildHasher> FieldLookup for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

/// Construct a candidate object directly from a string-keyed source using
/// each field's external name.
///
/// Generated by `#[derive(Validate)]` with `#[validate(from_fields)]`.
pub trait FromFieldMap: Sized {
    /// Bind every field from `lookup`.
    fn from_field_map(lookup: &dyn FieldLookup) -> Result<Self, BindError>;
}
