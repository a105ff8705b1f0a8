//! Schema documents and dynamic records for shapes defined at runtime.

use crate::annotation::ResolvedShape;
use crate::shape::{FieldDeclaration, FieldSource, RuleSpec, ShapeDeclaration};
use crate::value::{BindError, FieldKind, FieldLookup, FieldValue, FromFieldText};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Serializable shape definition.
///
/// ```toml
/// name = "Signup"
///
/// [[fields]]
/// name = "confirm_password"
/// wire = "confirmPassword"
/// type = "text"
/// rules = ["required", "eq_field=password"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Shape name.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<SchemaField>,
}

/// One field of a [`SchemaDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaField {
    /// Identifier.
    pub name: String,
    /// External name, when it differs from the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wire: Option<String>,
    /// Field kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Rules as `name` or `name=param`.
    #[serde(default)]
    pub rules: Vec<String>,
}

impl SchemaDocument {
    /// Build the declaration the resolver consumes.
    #[must_use]
    pub fn to_declaration(&self) -> ShapeDeclaration {
        self.fields
            .iter()
            .fold(ShapeDeclaration::new(self.name.as_str()), |shape, field| {
                let mut declaration = FieldDeclaration::new(field.name.as_str(), field.kind);
                if let Some(wire) = &field.wire {
                    declaration = declaration.wire_name(wire.as_str());
                }
                declaration.rules = field.rules.iter().map(|raw| RuleSpec::parse(raw)).collect();
                shape.field(declaration)
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum OwnedValue {
    Absent,
    Text(String),
    Integer(i128),
    Float(f64),
    Bool(bool),
    List(usize),
}

impl OwnedValue {
    fn borrow(&self) -> FieldValue<'_> {
        match self {
            Self::Absent => FieldValue::Absent,
            Self::Text(text) => FieldValue::Text(text),
            Self::Integer(value) => FieldValue::Integer(*value),
            Self::Float(value) => FieldValue::Float(*value),
            Self::Bool(value) => FieldValue::Bool(*value),
            Self::List(len) => FieldValue::List(*len),
        }
    }
}

/// Candidate object for a dynamic shape, keyed by field identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicRecord {
    values: HashMap<Box<str>, OwnedValue>,
}

impl DynamicRecord {
    /// Bind a JSON object. Keys are external names; unknown keys are
    /// ignored, `null` reads as absent.
    pub fn from_json(shape: &ResolvedShape, payload: &Value) -> Result<Self, BindError> {
        let Value::Object(object) = payload else {
            return Err(BindError::payload("expected a JSON object"));
        };

        let mut values = HashMap::with_capacity(shape.fields().len());
        for field in shape.fields() {
            let value = match object.get(&*field.wire_name) {
                None | Some(Value::Null) => OwnedValue::Absent,
                Some(raw) => json_value(field.kind, raw)
                    .map_err(|reason| BindError::new(field.wire_name.clone(), reason))?,
            };
            values.insert(field.ident.clone(), value);
        }
        Ok(Self { values })
    }

    /// Bind from a string-keyed source (query, params, headers) using each
    /// field's external name.
    pub fn from_lookup(shape: &ResolvedShape, lookup: &dyn FieldLookup) -> Result<Self, BindError> {
        let mut values = HashMap::with_capacity(shape.fields().len());
        for field in shape.fields() {
            let value = match lookup.lookup(&field.wire_name) {
                None => OwnedValue::Absent,
                Some(raw) => text_value(field.kind, raw)
                    .map_err(|reason| BindError::new(field.wire_name.clone(), reason))?,
            };
            values.insert(field.ident.clone(), value);
        }
        Ok(Self { values })
    }
}

impl FieldSource for DynamicRecord {
    fn field_value(&self, ident: &str) -> Option<FieldValue<'_>> {
        self.values.get(ident).map(OwnedValue::borrow)
    }
}

fn json_value(kind: FieldKind, raw: &Value) -> Result<OwnedValue, String> {
    let mismatch = || format!("expected {}", expected_label(kind));
    match (kind, raw) {
        (FieldKind::Text | FieldKind::Any, Value::String(text)) => Ok(OwnedValue::Text(text.clone())),
        (FieldKind::Bool | FieldKind::Any, Value::Bool(flag)) => Ok(OwnedValue::Bool(*flag)),
        (FieldKind::List | FieldKind::Any, Value::Array(items)) => Ok(OwnedValue::List(items.len())),
        (FieldKind::Integer, Value::Number(number)) => json_integer(number).ok_or_else(mismatch),
        (FieldKind::Float, Value::Number(number)) => {
            number.as_f64().map(OwnedValue::Float).ok_or_else(mismatch)
        },
        (FieldKind::Any, Value::Number(number)) => Ok(json_integer(number)
            .or_else(|| number.as_f64().map(OwnedValue::Float))
            .unwrap_or(OwnedValue::Absent)),
        (FieldKind::Any, Value::Object(_)) => Err("nested objects are not supported".to_owned()),
        _ => Err(mismatch()),
    }
}

fn json_integer(number: &serde_json::Number) -> Option<OwnedValue> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
        .map(OwnedValue::Integer)
}

fn text_value(kind: FieldKind, raw: &str) -> Result<OwnedValue, String> {
    Ok(match kind {
        FieldKind::Text | FieldKind::Any => OwnedValue::Text(raw.to_owned()),
        FieldKind::Integer => {
            Option::<i128>::from_field_text(raw)?.map_or(OwnedValue::Absent, OwnedValue::Integer)
        },
        FieldKind::Float => {
            Option::<f64>::from_field_text(raw)?.map_or(OwnedValue::Absent, OwnedValue::Float)
        },
        FieldKind::Bool => OwnedValue::Bool(bool::from_field_text(raw)?),
        FieldKind::List => OwnedValue::List(Vec::<String>::from_field_text(raw)?.len()),
    })
}

const fn expected_label(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "a string",
        FieldKind::Integer => "an integer",
        FieldKind::Float => "a number",
        FieldKind::Bool => "a boolean",
        FieldKind::List => "an array",
        FieldKind::Any => "a scalar or array",
    }
}
