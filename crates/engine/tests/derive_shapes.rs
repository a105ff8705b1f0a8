//! Derived shapes validated end to end through the standard registry.

use payload_guard_engine::{
    BindError, CheckError, ConfigurationError, FieldKind, FieldValue, FromFieldMap, Rule,
    RulePolicies, RuleRegistry, Shape, Validate, Validator, Verdict,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::error::Error;

#[derive(Debug, Validate)]
#[validate(name = "Signup")]
struct SignupRequest {
    #[validate(required, username)]
    username: String,
    #[validate(required, email)]
    email: String,
    #[validate(required, password)]
    password: String,
    #[validate(field = "confirmPassword", required, eq_field = "password")]
    confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreatePost {
    #[validate(required, min = 3, max = 120)]
    title: String,
    #[validate(required, slug)]
    post_slug: String,
    #[serde(rename = "state")]
    #[validate(one_of = "draft published")]
    status: Option<String>,
    #[validate(skip)]
    #[serde(skip)]
    internal_note: Vec<u8>,
}

#[derive(Debug, Validate)]
#[validate(from_fields)]
struct ListQuery {
    #[validate(gte = 1)]
    page: Option<u32>,
    #[validate(gte = 1, lte = 100)]
    per_page: Option<u32>,
    #[validate(field = "q", max = 64)]
    search: String,
    #[validate(gte = -90, lte = 90)]
    r#lat: Option<f64>,
}

#[derive(Debug, Validate)]
struct Window {
    #[validate(required)]
    start: u64,
    #[validate(required, gt_field = "start")]
    end: u64,
}

fn validator() -> Result<Validator, ConfigurationError> {
    Ok(Validator::new(RuleRegistry::standard(&RulePolicies::default())?))
}

fn signup() -> SignupRequest {
    SignupRequest {
        username: "test_user-1".to_owned(),
        email: "user@example.com".to_owned(),
        password: "Abc12345!".to_owned(),
        confirm_password: "Abc12345!".to_owned(),
    }
}

#[test]
fn valid_signup_passes() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;
    assert_eq!(validator.validate(&signup())?, Verdict::Valid);
    Ok(())
}

#[test]
fn mismatched_confirmation_is_keyed_to_the_confirming_field() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;
    let mut request = signup();
    request.confirm_password = "different".to_owned();

    let verdict = validator.validate(&request)?;
    let errors = verdict.errors().ok_or("expected a failure")?;

    assert_eq!(errors.len(), 1);
    assert!(errors.contains("confirmPassword"));
    assert!(!errors.contains("password"));
    assert_eq!(
        errors.message("confirmPassword"),
        Some("confirmPassword must match password")
    );
    Ok(())
}

#[test]
fn service_rules_reject_bad_values() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;
    let request = SignupRequest {
        username: "bad user".to_owned(),
        email: "not-an-email".to_owned(),
        password: "alllowercase123!".to_owned(),
        confirm_password: "alllowercase123!".to_owned(),
    };

    let verdict = validator.validate(&request)?;
    let errors = verdict.errors().ok_or("expected failures")?;

    assert_eq!(errors.len(), 3);
    assert_eq!(
        errors.message("username"),
        Some("username must be 3-30 characters, alphanumeric with optional underscores and hyphens")
    );
    assert_eq!(
        errors.message("email"),
        Some("email must be a valid email address")
    );
    assert_eq!(
        errors.message("password"),
        Some(
            "password must be at least 8 characters and contain uppercase, lowercase, number, and special character"
        )
    );
    Ok(())
}

#[test]
fn short_password_reports_one_message() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;
    let mut request = signup();
    request.password = "weak".to_owned();
    request.confirm_password = "weak".to_owned();

    let verdict = validator.validate(&request)?;
    let errors = verdict.errors().ok_or("expected a failure")?;

    assert_eq!(errors.len(), 1);
    assert!(errors.contains("password"));
    Ok(())
}

#[test]
fn serde_names_become_external_names() -> Result<(), Box<dyn Error>> {
    let declaration = CreatePost::declaration();
    let names: Vec<&str> = declaration
        .fields
        .iter()
        .map(|field| field.external_name())
        .collect();
    assert_eq!(names, ["title", "postSlug", "state"]);
    let nullable: Vec<bool> = declaration.fields.iter().map(|field| field.nullable).collect();
    assert_eq!(nullable, [false, false, true]);

    let post: CreatePost =
        serde_json::from_str(r#"{"title":"Hi","postSlug":"-bad","state":"archived"}"#)?;
    let verdict = validator()?.validate(&post)?;
    let errors = verdict.errors().ok_or("expected failures")?;

    assert_eq!(
        errors.message("title"),
        Some("title must be at least 3 characters")
    );
    assert!(errors.contains("postSlug"));
    assert_eq!(
        errors.message("state"),
        Some("state must be one of: draft published")
    );
    assert!(post.internal_note.is_empty());
    Ok(())
}

#[test]
fn optional_fields_skip_rules_when_empty() -> Result<(), Box<dyn Error>> {
    let post = CreatePost {
        title: "Hello".to_owned(),
        post_slug: "hello".to_owned(),
        status: None,
        internal_note: Vec::new(),
    };
    assert!(validator()?.validate(&post)?.is_valid());
    Ok(())
}

#[test]
fn field_maps_bind_by_external_name() -> Result<(), Box<dyn Error>> {
    let mut params = BTreeMap::new();
    params.insert("page".to_owned(), "2".to_owned());
    params.insert("per_page".to_owned(), "500".to_owned());
    params.insert("q".to_owned(), "rust".to_owned());
    params.insert("lat".to_owned(), "-95.5".to_owned());

    let query = ListQuery::from_field_map(&params)?;
    assert_eq!(query.page, Some(2));
    assert_eq!(query.search, "rust");

    let verdict = validator()?.validate(&query)?;
    let errors = verdict.errors().ok_or("expected failures")?;
    assert_eq!(
        errors.message("per_page"),
        Some("per_page must be less than or equal to 100")
    );
    assert_eq!(
        errors.message("lat"),
        Some("lat must be greater than or equal to -90")
    );
    Ok(())
}

#[test]
fn field_map_parse_failures_are_bind_errors() {
    let mut params = BTreeMap::new();
    params.insert("page".to_owned(), "two".to_owned());

    let error = ListQuery::from_field_map(&params).err();
    assert_eq!(
        error,
        Some(BindError::new("page", "must be a valid integer"))
    );
}

#[test]
fn ordered_cross_field_rules_compare_numerically() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;

    assert!(validator.validate(&Window { start: 9, end: 10 })?.is_valid());
    let verdict = validator.validate(&Window { start: 10, end: 9 })?;
    assert_eq!(
        verdict.errors().and_then(|errors| errors.message("end")),
        Some("end must be greater than start")
    );
    Ok(())
}

#[derive(Debug, Validate)]
struct Misspelled {
    #[validate(requird)]
    name: String,
}

#[test]
fn unknown_rules_fail_before_any_request() -> Result<(), Box<dyn Error>> {
    let validator = validator()?;

    assert!(matches!(
        validator.prepare::<Misspelled>(),
        Err(ConfigurationError::UnknownRule { .. })
    ));
    assert!(matches!(
        validator.check(Misspelled {
            name: "x".to_owned()
        }),
        Err(CheckError::Configuration(_))
    ));
    Ok(())
}

#[derive(Debug, Validate)]
struct Badge {
    #[validate(required, even)]
    level: i32,
}

#[test]
fn custom_rules_plug_into_derived_shapes() -> Result<(), Box<dyn Error>> {
    let mut registry = RuleRegistry::standard(&RulePolicies::default())?;
    registry.register(
        Rule::new("even", |input| match input.value {
            FieldValue::Integer(value) => value % 2 == 0,
            _ => false,
        })
        .applies_to(&[FieldKind::Integer])
        .message("{field} must be even"),
    )?;
    let validator = Validator::new(registry);

    assert!(validator.validate(&Badge { level: 4 })?.is_valid());
    let verdict = validator.validate(&Badge { level: 3 })?;
    assert_eq!(
        verdict.errors().and_then(|errors| errors.message("level")),
        Some("level must be even")
    );
    Ok(())
}

#[test]
fn validated_object_is_the_caller_value() -> Result<(), Box<dyn Error>> {
    let validated = validator()?.check(signup())?;
    assert_eq!(validated.username, "test_user-1");
    assert_eq!(validated.into_inner().confirm_password, "Abc12345!");
    Ok(())
}
