//! # payload-guard-config
//!
//! Engine configuration: rule policies, message overrides and logging
//! defaults, loaded from JSON or TOML with env overrides applied last.
//! This crate depends on `engine` and `shared` only.

/// Environment variable parsing and merging.
pub mod env;
/// Config and schema loading helpers (file + env).
pub mod load;
/// Configuration schema types and helpers.
pub mod schema;

pub use env::{
    ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_PASSWORD_MIN_LENGTH, ENV_USERNAME_MAX_LENGTH,
    ENV_USERNAME_MIN_LENGTH, EngineEnv, EnvParseError, apply_env_overrides,
};
pub use load::{
    load_engine_config_from_path, load_engine_config_std_env, load_schema_from_path,
    to_pretty_json, to_pretty_toml,
};
pub use schema::{
    CURRENT_CONFIG_VERSION, ConfigSchemaError, EngineConfig, LogConfig, LogFormat,
    PasswordConfig, UsernameConfig, ValidatedEngineConfig, parse_engine_config_json,
    parse_engine_config_toml,
};

use payload_guard_engine::{ConfigurationError, RuleRegistry, Validator};

/// Seed the standard registry from a validated config.
///
/// Message overrides naming a rule that does not exist fail here, at
/// startup, rather than on the first request.
pub fn build_registry(config: &ValidatedEngineConfig) -> Result<RuleRegistry, ConfigurationError> {
    RuleRegistry::standard(&config.rule_policies())
}

/// Build a validator backed by the standard registry.
pub fn build_validator(config: &ValidatedEngineConfig) -> Result<Validator, ConfigurationError> {
    build_registry(config).map(Validator::new)
}

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
