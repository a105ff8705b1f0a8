//! Derive macro for `payload_guard_engine::Shape`.
//!
//! Every named field that is not `#[validate(skip)]` becomes part of the
//! shape; its type must implement `ToFieldValue`.

use proc_macro::TokenStream;
use quote::{ToTokens, quote};
use syn::ext::IdentExt;
use syn::punctuated::Punctuated;
use syn::{Attribute, Data, DeriveInput, Expr, Fields, Ident, Lit, LitStr, Meta, Token, Type, UnOp};

/// Derive `FieldSource` + `Shape` (and `FromFieldMap` with
/// `#[validate(from_fields)]`) from `#[validate(...)]` annotations.
#[proc_macro_derive(Validate, attributes(validate))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_validate(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_validate(input: &DeriveInput) -> Result<proc_macro2::TokenStream, syn::Error> {
    let Data::Struct(struct_data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Validate can only be derived for structs",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Validate does not support generic structs",
        ));
    }

    let fields = match &struct_data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_data.fields,
                "Validate requires named fields",
            ));
        },
    };

    let container = parse_container(&input.attrs, &input.ident)?;
    let mut annotated = Vec::new();
    let mut skipped = Vec::new();
    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let parsed = parse_field(&field.attrs, ident, container.rename_all)?;
        if parsed.skip {
            skipped.push(ident.clone());
        } else {
            annotated.push(AnnotatedField {
                ident: ident.clone(),
                ty: field.ty.clone(),
                wire_name: parsed.wire_name,
                rules: parsed.rules,
            });
        }
    }

    let name = &input.ident;
    let shape_name = LitStr::new(&container.name, proc_macro2::Span::call_site());

    let match_arms = annotated.iter().map(|field| {
        let ident = &field.ident;
        let key = ident_literal(ident);
        quote! {
            #key => ::core::option::Option::Some(
                ::payload_guard_engine::ToFieldValue::to_field_value(&self.#ident)
            ),
        }
    });

    let declarations = annotated.iter().map(|field| {
        let key = ident_literal(&field.ident);
        let ty = &field.ty;
        let wire = LitStr::new(&field.wire_name, proc_macro2::Span::call_site());
        let rules = field.rules.iter().map(|(rule, param)| {
            let param = param.as_ref().map_or_else(
                || quote! { ::core::option::Option::None },
                |value| quote! { ::core::option::Option::Some(#value) },
            );
            quote! { .rule(#rule, #param) }
        });
        quote! {
            .field(
                ::payload_guard_engine::FieldDeclaration::new(
                    #key,
                    <#ty as ::payload_guard_engine::ToFieldValue>::KIND,
                )
                .nullable(<#ty as ::payload_guard_engine::ToFieldValue>::NULLABLE)
                .wire_name(#wire)
                #(#rules)*
            )
        }
    });

    let from_fields = container
        .from_fields
        .then(|| expand_from_fields(name, &annotated, &skipped));

    Ok(quote! {
        impl ::payload_guard_engine::FieldSource for #name {
            fn field_value(
                &self,
                ident: &str,
            ) -> ::core::option::Option<::payload_guard_engine::FieldValue<'_>> {
                match ident {
                    #(#match_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }

        impl ::payload_guard_engine::Shape for #name {
            fn declaration() -> ::payload_guard_engine::ShapeDeclaration {
                ::payload_guard_engine::ShapeDeclaration::new(#shape_name)
                    #(#declarations)*
            }
        }

        #from_fields
    })
}

fn expand_from_fields(
    name: &Ident,
    annotated: &[AnnotatedField],
    skipped: &[Ident],
) -> proc_macro2::TokenStream {
    let bound = annotated.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        let wire = LitStr::new(&field.wire_name, proc_macro2::Span::call_site());
        quote! {
            #ident: match ::payload_guard_engine::FieldLookup::lookup(lookup, #wire) {
                ::core::option::Option::Some(raw) => {
                    <#ty as ::payload_guard_engine::FromFieldText>::from_field_text(raw)
                        .map_err(|reason| ::payload_guard_engine::BindError::new(#wire, reason))?
                },
                ::core::option::Option::None => {
                    <#ty as ::payload_guard_engine::FromFieldText>::empty()
                },
            },
        }
    });
    let defaulted = skipped.iter().map(|ident| {
        quote! { #ident: ::core::default::Default::default(), }
    });

    quote! {
        impl ::payload_guard_engine::FromFieldMap for #name {
            fn from_field_map(
                lookup: &dyn ::payload_guard_engine::FieldLookup,
            ) -> ::core::result::Result<Self, ::payload_guard_engine::BindError> {
                ::core::result::Result::Ok(Self {
                    #(#bound)*
                    #(#defaulted)*
                })
            }
        }
    }
}

struct AnnotatedField {
    ident: Ident,
    ty: Type,
    wire_name: String,
    rules: Vec<(String, Option<String>)>,
}

struct Container {
    name: String,
    from_fields: bool,
    rename_all: Option<RenameRule>,
}

fn parse_container(attrs: &[Attribute], ident: &Ident) -> Result<Container, syn::Error> {
    let mut name: Option<String> = None;
    let mut from_fields = false;
    for attr in attrs {
        if !attr.path().is_ident("validate") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                if name.is_some() {
                    return Err(meta.error("duplicate validate(name = ...)"));
                }
                name = Some(value.value());
                return Ok(());
            }
            if meta.path.is_ident("from_fields") {
                from_fields = true;
                return Ok(());
            }
            Err(meta.error("unsupported validate attribute on container"))
        })?;
    }

    let rename_all = match serde_value(attrs, "rename_all")? {
        Some(value) => Some(RenameRule::parse(&value)?),
        None => None,
    };

    Ok(Container {
        name: name.unwrap_or_else(|| ident.unraw().to_string()),
        from_fields,
        rename_all,
    })
}

struct ParsedField {
    wire_name: String,
    rules: Vec<(String, Option<String>)>,
    skip: bool,
}

fn parse_field(
    attrs: &[Attribute],
    ident: &Ident,
    rename_all: Option<RenameRule>,
) -> Result<ParsedField, syn::Error> {
    let mut rules = Vec::new();
    let mut wire_override: Option<String> = None;
    let mut skip = false;
    for attr in attrs {
        if !attr.path().is_ident("validate") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("field") {
                let value: LitStr = meta.value()?.parse()?;
                if wire_override.is_some() {
                    return Err(meta.error("duplicate validate(field = ...)"));
                }
                wire_override = Some(value.value());
                return Ok(());
            }
            if meta.path.is_ident("skip") {
                skip = true;
                return Ok(());
            }
            let Some(rule) = meta.path.get_ident() else {
                return Err(meta.error("rule names must be plain identifiers"));
            };
            let param = if meta.input.peek(Token![=]) {
                let expr: Expr = meta.value()?.parse()?;
                Some(expr_to_param(&expr)?)
            } else {
                None
            };
            rules.push((rule.unraw().to_string(), param));
            Ok(())
        })?;
    }

    if skip && (!rules.is_empty() || wire_override.is_some()) {
        return Err(syn::Error::new_spanned(
            ident,
            "validate(skip) cannot be combined with rules or a field name",
        ));
    }

    let plain = ident.unraw().to_string();
    let wire_name = match wire_override {
        Some(name) => name,
        None => match serde_value(attrs, "rename")? {
            Some(name) => name,
            None => rename_all.map_or_else(|| plain.clone(), |rule| rule.apply(&plain)),
        },
    };

    Ok(ParsedField {
        wire_name,
        rules,
        skip,
    })
}

fn expr_to_param(expr: &Expr) -> Result<String, syn::Error> {
    match expr {
        Expr::Lit(lit) => Ok(lit_to_string(&lit.lit)),
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => {
            expr_to_param(&unary.expr).map(|value| format!("-{value}"))
        },
        Expr::Group(group) => expr_to_param(&group.expr),
        _ => Err(syn::Error::new_spanned(
            expr,
            "rule parameters must be literals",
        )),
    }
}

/// Reads `#[serde(key = "...")]`, ignoring every other serde option.
fn serde_value(attrs: &[Attribute], key: &str) -> Result<Option<String>, syn::Error> {
    let mut found = None;
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        let metas = attr.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;
        for meta in metas {
            let Meta::NameValue(name_value) = meta else {
                continue;
            };
            if !name_value.path.is_ident(key) {
                continue;
            }
            if let Expr::Lit(syn::ExprLit { lit: Lit::Str(value), .. }) = &name_value.value {
                found = Some(value.value());
            }
        }
    }
    Ok(found)
}

#[derive(Debug, Clone, Copy)]
enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    fn parse(value: &str) -> Result<Self, syn::Error> {
        Ok(match value {
            "lowercase" => Self::Lower,
            "UPPERCASE" => Self::Upper,
            "PascalCase" => Self::Pascal,
            "camelCase" => Self::Camel,
            "snake_case" => Self::Snake,
            "SCREAMING_SNAKE_CASE" => Self::ScreamingSnake,
            "kebab-case" => Self::Kebab,
            "SCREAMING-KEBAB-CASE" => Self::ScreamingKebab,
            _ => {
                return Err(syn::Error::new(
                    proc_macro2::Span::call_site(),
                    format!("unsupported serde rename_all value `{value}`"),
                ));
            },
        })
    }

    /// Converts a snake_case field identifier.
    fn apply(self, field: &str) -> String {
        match self {
            Self::Lower | Self::Snake => field.to_owned(),
            Self::Upper | Self::ScreamingSnake => field.to_ascii_uppercase(),
            Self::Kebab => field.replace('_', "-"),
            Self::ScreamingKebab => field.to_ascii_uppercase().replace('_', "-"),
            Self::Pascal | Self::Camel => {
                let mut out = String::with_capacity(field.len());
                let mut capitalize = matches!(self, Self::Pascal);
                for c in field.chars() {
                    if c == '_' {
                        capitalize = true;
                    } else if capitalize {
                        out.push(c.to_ascii_uppercase());
                        capitalize = false;
                    } else {
                        out.push(c);
                    }
                }
                out
            },
        }
    }
}

fn ident_literal(ident: &Ident) -> LitStr {
    LitStr::new(&ident.unraw().to_string(), ident.span())
}

fn lit_to_string(lit: &Lit) -> String {
    match lit {
        Lit::Int(value) => value.base10_digits().to_string(),
        Lit::Float(value) => value.base10_digits().to_string(),
        Lit::Str(value) => value.value(),
        Lit::Bool(value) => value.value.to_string(),
        _ => lit.to_token_stream().to_string(),
    }
}
