//! Field annotation resolver: turns a declared shape into rule bindings
//! checked against a registry.

use crate::error::ConfigurationError;
use crate::registry::RuleRegistry;
use crate::rules::{ParamKind, Rule, RuleParam};
use crate::shape::{FieldDeclaration, RuleSpec, ShapeDeclaration};
use crate::value::{FieldKind, Number};
use std::collections::HashSet;
use std::sync::Arc;

/// A rule bound to a parsed parameter.
#[derive(Debug, Clone)]
pub struct BoundRule {
    /// Registered rule.
    pub rule: Arc<Rule>,
    /// Parsed parameter.
    pub param: RuleParam,
    /// Parameter as shown in messages (the referenced field's external name
    /// for cross-field rules).
    pub display_param: Box<str>,
}

/// Resolved metadata for one field.
#[derive(Debug, Clone)]
pub struct FieldAnnotation {
    /// Identifier on the target structure.
    pub ident: Box<str>,
    /// External name used as the error key.
    pub wire_name: Box<str>,
    /// Field kind.
    pub kind: FieldKind,
    /// Rules in declaration order.
    pub rules: Vec<BoundRule>,
    /// True when the field carries no `required` rule.
    pub optional: bool,
}

/// Resolved metadata for a whole shape.
#[derive(Debug, Clone)]
pub struct ResolvedShape {
    name: Box<str>,
    fields: Vec<FieldAnnotation>,
}

impl ResolvedShape {
    /// Shape name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldAnnotation] {
        &self.fields
    }

    /// Find a field by external name, falling back to the identifier.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldAnnotation> {
        self.fields
            .iter()
            .find(|field| &*field.wire_name == name)
            .or_else(|| self.fields.iter().find(|field| &*field.ident == name))
    }
}

/// Resolve `declaration` against `registry`.
///
/// Deterministic: the same declaration and registry always produce the same
/// annotations or the same error.
pub fn resolve(
    declaration: &ShapeDeclaration,
    registry: &RuleRegistry,
) -> Result<ResolvedShape, ConfigurationError> {
    let mut seen = HashSet::new();
    for field in &declaration.fields {
        if !seen.insert(field.external_name()) {
            return Err(ConfigurationError::malformed(
                "field",
                &location(declaration, field),
                format!("duplicate external name `{}`", field.external_name()),
            ));
        }
    }

    let fields = declaration
        .fields
        .iter()
        .map(|field| resolve_field(declaration, field, registry))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(
        shape = %declaration.name,
        fields = fields.len(),
        "resolved shape annotations"
    );

    Ok(ResolvedShape {
        name: declaration.name.clone(),
        fields,
    })
}

fn resolve_field(
    declaration: &ShapeDeclaration,
    field: &FieldDeclaration,
    registry: &RuleRegistry,
) -> Result<FieldAnnotation, ConfigurationError> {
    let location = location(declaration, field);
    let rules = field
        .rules
        .iter()
        .map(|spec| bind_rule(declaration, field, spec, registry, &location))
        .collect::<Result<Vec<_>, _>>()?;
    let optional = !field.rules.iter().any(|spec| &*spec.name == "required");

    Ok(FieldAnnotation {
        ident: field.ident.clone(),
        wire_name: field.external_name().into(),
        kind: field.kind,
        rules,
        optional,
    })
}

fn bind_rule(
    declaration: &ShapeDeclaration,
    field: &FieldDeclaration,
    spec: &RuleSpec,
    registry: &RuleRegistry,
    location: &str,
) -> Result<BoundRule, ConfigurationError> {
    let rule = registry
        .get(&spec.name)
        .ok_or_else(|| ConfigurationError::UnknownRule {
            rule: spec.name.clone(),
            location: location.into(),
        })?;
    let malformed = |reason: String| ConfigurationError::malformed(&spec.name, location, reason);

    if !rule.accepts(field.kind) {
        return Err(malformed(format!("does not apply to {} fields", field.kind)));
    }

    let param_kind = rule.param_kind();
    let raw = match (param_kind, spec.param.as_deref().map(str::trim)) {
        (ParamKind::None, None) => {
            return Ok(BoundRule {
                rule: Arc::clone(rule),
                param: RuleParam::None,
                display_param: "".into(),
            });
        },
        (ParamKind::None, Some(_)) => return Err(malformed("takes no parameter".to_owned())),
        (_, None | Some("")) => return Err(malformed("requires a parameter".to_owned())),
        (_, Some(raw)) => raw,
    };

    let (param, display_param): (RuleParam, Box<str>) = match param_kind {
        ParamKind::Bound => {
            let bound = parse_bound(field.kind, raw).map_err(malformed)?;
            (RuleParam::Number(bound), raw.into())
        },
        ParamKind::Words => (
            RuleParam::Words(raw.split_whitespace().map(Into::into).collect()),
            raw.into(),
        ),
        ParamKind::Text => (RuleParam::Text(raw.into()), raw.into()),
        ParamKind::Field | ParamKind::OrderedField => {
            let target = find_target(declaration, field, raw).map_err(malformed)?;
            if !comparable(param_kind, field.kind, target.kind) {
                return Err(malformed(format!(
                    "cannot compare {} field with {} field `{}`",
                    field.kind,
                    target.kind,
                    target.external_name()
                )));
            }
            (
                RuleParam::Field {
                    ident: target.ident.clone(),
                    wire: target.external_name().into(),
                },
                target.external_name().into(),
            )
        },
        ParamKind::None => (RuleParam::None, "".into()),
    };

    Ok(BoundRule {
        rule: Arc::clone(rule),
        param,
        display_param,
    })
}

fn parse_bound(kind: FieldKind, raw: &str) -> Result<Number, String> {
    let number = Number::parse(raw).ok_or_else(|| format!("`{raw}` is not a number"))?;
    if (kind.is_sized() || kind == FieldKind::Any) && number.as_length().is_none() {
        return Err(format!("length bound `{raw}` must be a non-negative integer"));
    }
    Ok(number)
}

fn find_target<'d>(
    declaration: &'d ShapeDeclaration,
    field: &FieldDeclaration,
    name: &str,
) -> Result<&'d FieldDeclaration, String> {
    let target = declaration
        .fields
        .iter()
        .find(|candidate| &*candidate.ident == name)
        .or_else(|| {
            declaration
                .fields
                .iter()
                .find(|candidate| candidate.external_name() == name)
        })
        .ok_or_else(|| format!("references unknown field `{name}`"))?;
    if target.ident == field.ident {
        return Err("references its own field".to_owned());
    }
    Ok(target)
}

fn comparable(param: ParamKind, left: FieldKind, right: FieldKind) -> bool {
    if left == FieldKind::Any || right == FieldKind::Any {
        return true;
    }
    match param {
        ParamKind::OrderedField => left.is_numeric() && right.is_numeric(),
        _ => left == right || (left.is_numeric() && right.is_numeric()),
    }
}

fn location(declaration: &ShapeDeclaration, field: &FieldDeclaration) -> String {
    format!("{}.{}", declaration.name, field.ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RuleRegistry {
        RuleRegistry::with_builtins()
    }

    fn reason(error: &ConfigurationError) -> &str {
        match error {
            ConfigurationError::MalformedAnnotation { reason, .. } => reason,
            _ => "",
        }
    }

    #[test]
    fn resolves_names_params_and_optionality() -> Result<(), ConfigurationError> {
        let declaration = ShapeDeclaration::new("Signup")
            .field(
                FieldDeclaration::new("password", FieldKind::Text)
                    .rule("required", None)
                    .rule("min", Some("8")),
            )
            .field(
                FieldDeclaration::new("confirm_password", FieldKind::Text)
                    .wire_name("confirmPassword")
                    .rule("eq_field", Some("password")),
            );

        let shape = resolve(&declaration, &registry())?;
        let fields = shape.fields();

        assert_eq!(fields.len(), 2);
        assert!(!fields[0].optional);
        assert!(fields[1].optional);
        assert_eq!(&*fields[1].wire_name, "confirmPassword");
        assert_eq!(&*fields[1].rules[0].display_param, "password");
        assert!(shape.field_by_name("confirmPassword").is_some());
        assert!(shape.field_by_name("confirm_password").is_some());
        Ok(())
    }

    #[test]
    fn non_numeric_bound_is_malformed() {
        let declaration = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("name", FieldKind::Text).rule("min", Some("eight")));

        let error = resolve(&declaration, &registry()).err();
        assert!(matches!(
            error,
            Some(ConfigurationError::MalformedAnnotation { ref location, .. })
                if &**location == "Bad.name"
        ));
    }

    #[test]
    fn negative_length_bound_is_malformed() {
        let declaration = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("name", FieldKind::Text).rule("max", Some("-1")));

        let error = resolve(&declaration, &registry()).err();
        assert!(error.is_some_and(|error| reason(&error).contains("non-negative")));
    }

    #[test]
    fn negative_numeric_bound_is_allowed() {
        let declaration = ShapeDeclaration::new("Temp")
            .field(FieldDeclaration::new("celsius", FieldKind::Integer).rule("gte", Some("-40")));

        assert!(resolve(&declaration, &registry()).is_ok());
    }

    #[test]
    fn kind_mismatch_is_malformed() {
        let declaration = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("age", FieldKind::Integer).rule("email", None));

        let error = resolve(&declaration, &registry()).err();
        assert!(error.is_some_and(|error| reason(&error).contains("integer fields")));
    }

    #[test]
    fn untyped_fields_take_only_unrestricted_rules() {
        let restricted = ShapeDeclaration::new("Contact")
            .field(FieldDeclaration::new("contact", FieldKind::Any).rule("email", None));
        let negative = ShapeDeclaration::new("Contact")
            .field(FieldDeclaration::new("nick", FieldKind::Any).rule("max", Some("-1")));
        let unrestricted = ShapeDeclaration::new("Contact")
            .field(FieldDeclaration::new("contact", FieldKind::Any).rule("required", None));

        let error = resolve(&restricted, &registry()).err();
        assert!(error.is_some_and(|error| reason(&error).contains("any fields")));
        assert!(matches!(
            resolve(&negative, &registry()),
            Err(ConfigurationError::MalformedAnnotation { .. })
        ));
        assert!(resolve(&unrestricted, &registry()).is_ok());
    }

    #[test]
    fn negative_bound_on_untyped_field_is_malformed() {
        let mut registry = registry();
        let signed = Rule::new("above", |_| true).param(ParamKind::Bound);
        assert!(registry.register(signed).is_ok());
        let declaration = ShapeDeclaration::new("Contact")
            .field(FieldDeclaration::new("nick", FieldKind::Any).rule("above", Some("-1")));

        let error = resolve(&declaration, &registry).err();
        assert!(error.is_some_and(|error| reason(&error).contains("non-negative")));
    }

    #[test]
    fn unknown_rule_names_the_location() {
        let declaration = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("email", FieldKind::Text).rule("emial", None));

        assert!(matches!(
            resolve(&declaration, &registry()),
            Err(ConfigurationError::UnknownRule { ref rule, ref location })
                if &**rule == "emial" && &**location == "Bad.email"
        ));
    }

    #[test]
    fn cross_field_references_must_exist_and_compare() {
        let missing = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("confirm", FieldKind::Text).rule("eq_field", Some("pw")));
        let self_ref = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("pw", FieldKind::Text).rule("eq_field", Some("pw")));
        let mixed = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("start", FieldKind::Text))
            .field(FieldDeclaration::new("end", FieldKind::Integer).rule("gt_field", Some("start")));

        for declaration in [missing, self_ref, mixed] {
            assert!(matches!(
                resolve(&declaration, &registry()),
                Err(ConfigurationError::MalformedAnnotation { .. })
            ));
        }
    }

    #[test]
    fn parameter_presence_is_checked() {
        let missing = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("name", FieldKind::Text).rule("min", None));
        let unexpected = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("name", FieldKind::Text).rule("required", Some("yes")));

        assert!(resolve(&missing, &registry()).is_err());
        assert!(resolve(&unexpected, &registry()).is_err());
    }

    #[test]
    fn duplicate_external_names_are_malformed() {
        let declaration = ShapeDeclaration::new("Bad")
            .field(FieldDeclaration::new("a", FieldKind::Text).wire_name("name"))
            .field(FieldDeclaration::new("name", FieldKind::Text));

        assert!(resolve(&declaration, &registry()).is_err());
    }
}
