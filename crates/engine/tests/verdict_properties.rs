//! Property tests for full and partial validation.

use payload_guard_engine::{
    ConfigurationError, RulePolicies, RuleRegistry, Validate, Validator, Verdict,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Validate)]
struct Profile {
    #[validate(required, username)]
    username: String,
    #[validate(field = "handle", required, slug)]
    profile_slug: String,
    #[validate(required, gte = 18, lte = 130)]
    age: u32,
    #[validate(min = 2, max = 10)]
    nickname: Option<String>,
    #[validate(field = "websiteUrl", url)]
    website: Option<String>,
}

const FIELD_NAMES: [&str; 5] = ["username", "handle", "age", "nickname", "websiteUrl"];

fn validator() -> Result<Validator, ConfigurationError> {
    Ok(Validator::new(RuleRegistry::standard(&RulePolicies::default())?))
}

fn error_map(verdict: &Verdict) -> BTreeMap<String, String> {
    verdict.errors().map(|errors| errors.messages()).unwrap_or_default()
}

fn valid_profile() -> impl Strategy<Value = Profile> {
    (
        "[a-zA-Z0-9_-]{3,30}",
        "[a-z0-9]{1,8}(-[a-z0-9]{1,8}){0,3}",
        18u32..=130,
        proptest::option::of("[a-zA-Z]{2,10}"),
        proptest::option::of("https://[a-z]{1,12}\\.(com|org|dev)/[a-z0-9]{0,8}"),
    )
        .prop_map(|(username, profile_slug, age, nickname, website)| Profile {
            username,
            profile_slug,
            age,
            nickname,
            website,
        })
}

fn any_profile() -> impl Strategy<Value = Profile> {
    (
        ".{0,40}",
        "[-a-zA-Z0-9_ ]{0,12}",
        0u32..200,
        proptest::option::of(".{0,14}"),
        proptest::option::of("[a-z:/.]{0,20}"),
    )
        .prop_map(|(username, profile_slug, age, nickname, website)| Profile {
            username,
            profile_slug,
            age,
            nickname,
            website,
        })
}

fn break_field(mut profile: Profile, index: usize) -> (Profile, &'static str) {
    match index {
        0 => profile.username = "a b".to_owned(),
        1 => profile.profile_slug = "-leading".to_owned(),
        2 => profile.age = 17,
        3 => profile.nickname = Some("x".to_owned()),
        _ => profile.website = Some("not a url".to_owned()),
    }
    (profile, FIELD_NAMES[index.min(FIELD_NAMES.len() - 1)])
}

proptest! {
    #[test]
    fn conforming_objects_are_valid(profile in valid_profile()) {
        let validator = validator()?;
        prop_assert_eq!(validator.validate(&profile)?, Verdict::Valid);
    }

    #[test]
    fn one_violation_yields_one_entry(profile in valid_profile(), index in 0usize..5) {
        let validator = validator()?;
        let (broken, field) = break_field(profile, index);

        let verdict = validator.validate(&broken)?;
        let errors = error_map(&verdict);
        prop_assert_eq!(errors.len(), 1);
        prop_assert!(errors.contains_key(field));
    }

    #[test]
    fn validation_is_idempotent(profile in any_profile()) {
        let validator = validator()?;
        let first = validator.validate(&profile)?;
        let second = validator.validate(&profile)?;
        prop_assert_eq!(first, second);
    }

    #[test]
    fn partial_results_restrict_full_results(
        profile in any_profile(),
        subset in proptest::sample::subsequence(FIELD_NAMES.to_vec(), 1..=FIELD_NAMES.len()),
    ) {
        let validator = validator()?;
        let full = error_map(&validator.validate(&profile)?);
        let partial = error_map(&validator.validate_partial(&profile, &subset)?);

        let expected: BTreeMap<String, String> = full
            .into_iter()
            .filter(|(field, _)| subset.contains(&field.as_str()))
            .collect();
        prop_assert_eq!(partial, expected);
    }
}
