//! Environment variable parsing and env-to-config merging.
//!
//! Env parsing is strict: a variable that is present must parse, otherwise
//! loading fails before any override is applied.

use crate::schema::{EngineConfig, LogFormat, ValidatedEngineConfig};
use payload_guard_shared::{ErrorCode, ErrorEnvelope};
use std::collections::BTreeMap;
use std::fmt;

/// Env var: password minimum length.
pub const ENV_PASSWORD_MIN_LENGTH: &str = "PGUARD_PASSWORD_MIN_LENGTH";
/// Env var: username minimum length.
pub const ENV_USERNAME_MIN_LENGTH: &str = "PGUARD_USERNAME_MIN_LENGTH";
/// Env var: username maximum length.
pub const ENV_USERNAME_MAX_LENGTH: &str = "PGUARD_USERNAME_MAX_LENGTH";
/// Env var: default log level.
pub const ENV_LOG_LEVEL: &str = "PGUARD_LOG_LEVEL";
/// Env var: log format (`text` or `json`).
pub const ENV_LOG_FORMAT: &str = "PGUARD_LOG_FORMAT";

const ENV_VARS: [&str; 5] = [
    ENV_PASSWORD_MIN_LENGTH,
    ENV_USERNAME_MIN_LENGTH,
    ENV_USERNAME_MAX_LENGTH,
    ENV_LOG_LEVEL,
    ENV_LOG_FORMAT,
];

/// Typed env-derived overrides for `EngineConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineEnv {
    /// Override for `password.minLength`.
    pub password_min_length: Option<u32>,
    /// Override for `username.minLength`.
    pub username_min_length: Option<u32>,
    /// Override for `username.maxLength`.
    pub username_max_length: Option<u32>,
    /// Override for `log.level`.
    pub log_level: Option<Box<str>>,
    /// Override for `log.format`.
    pub log_format: Option<LogFormat>,
}

impl EngineEnv {
    /// Parse overrides from a map of env var name to raw value.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, EnvParseError> {
        Ok(Self {
            password_min_length: parse_optional_u32(map, ENV_PASSWORD_MIN_LENGTH)?,
            username_min_length: parse_optional_u32(map, ENV_USERNAME_MIN_LENGTH)?,
            username_max_length: parse_optional_u32(map, ENV_USERNAME_MAX_LENGTH)?,
            log_level: parse_optional_trimmed_string(map, ENV_LOG_LEVEL)?,
            log_format: parse_optional_log_format(map, ENV_LOG_FORMAT)?,
        })
    }

    /// Parse overrides from the process environment.
    pub fn from_std_env() -> Result<Self, EnvParseError> {
        let mut map = BTreeMap::new();
        for name in ENV_VARS {
            if let Ok(value) = std::env::var(name) {
                map.insert(name.to_owned(), value);
            }
        }
        Self::from_map(&map)
    }

    /// Returns true when no override is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.password_min_length.is_none()
            && self.username_min_length.is_none()
            && self.username_max_length.is_none()
            && self.log_level.is_none()
            && self.log_format.is_none()
    }
}

/// Apply env overrides on top of `base`, then validate and normalize.
pub fn apply_env_overrides(
    base: EngineConfig,
    env: &EngineEnv,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let mut config = base;
    if let Some(value) = env.password_min_length {
        config.password.min_length = value;
    }
    if let Some(value) = env.username_min_length {
        config.username.min_length = value;
    }
    if let Some(value) = env.username_max_length {
        config.username.max_length = value;
    }
    if let Some(value) = &env.log_level {
        config.log.level = value.clone();
    }
    if let Some(value) = env.log_format {
        config.log.format = value;
    }

    config.validate_and_normalize().map_err(Into::into)
}

/// Validation failures when parsing env variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvParseError {
    /// An env var was present but empty after trimming.
    EmptyValue {
        /// Env var name.
        var: &'static str,
    },
    /// Integer env var had an invalid value.
    InvalidInt {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
    /// Enum env var had an invalid value.
    InvalidEnum {
        /// Env var name.
        var: &'static str,
        /// Raw input value.
        value: String,
    },
}

impl EnvParseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::EmptyValue { .. } => ErrorCode::new("config", "empty_env_var"),
            Self::InvalidInt { .. } => ErrorCode::new("config", "invalid_env_int"),
            Self::InvalidEnum { .. } => ErrorCode::new("config", "invalid_env_enum"),
        }
    }
}

impl fmt::Display for EnvParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyValue { var } => write!(formatter, "{var} must be non-empty"),
            Self::InvalidInt { var, .. } => write!(formatter, "{var} must be an integer"),
            Self::InvalidEnum { var, .. } => write!(formatter, "{var} has an unsupported value"),
        }
    }
}

impl std::error::Error for EnvParseError {}

impl From<EnvParseError> for ErrorEnvelope {
    fn from(error: EnvParseError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            EnvParseError::EmptyValue { var } => {
                envelope = envelope.with_metadata("env_var", var);
            },
            EnvParseError::InvalidInt { var, value } | EnvParseError::InvalidEnum { var, value } => {
                envelope = envelope
                    .with_metadata("env_var", var)
                    .with_metadata("value", value);
            },
        }

        envelope
    }
}

fn parse_optional_trimmed_string(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<Box<str>>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    Ok(Some(trimmed.to_owned().into_boxed_str()))
}

fn parse_optional_u32(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<u32>, EnvParseError> {
    let Some(raw) = map.get(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EnvParseError::EmptyValue { var });
    }

    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| EnvParseError::InvalidInt {
            var,
            value: raw.clone(),
        })
}

fn parse_optional_log_format(
    map: &BTreeMap<String, String>,
    var: &'static str,
) -> Result<Option<LogFormat>, EnvParseError> {
    let Some(raw) = parse_optional_trimmed_string(map, var)? else {
        return Ok(None);
    };
    LogFormat::parse(&raw)
        .map(Some)
        .ok_or_else(|| EnvParseError::InvalidEnum {
            var,
            value: raw.into_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn empty_map_has_no_overrides() -> Result<(), EnvParseError> {
        assert!(EngineEnv::from_map(&BTreeMap::new())?.is_empty());
        Ok(())
    }

    #[test]
    fn values_are_trimmed_and_typed() -> Result<(), EnvParseError> {
        let env = EngineEnv::from_map(&env_map(&[
            (ENV_PASSWORD_MIN_LENGTH, " 12 "),
            (ENV_LOG_FORMAT, "JSON"),
        ]))?;
        assert_eq!(env.password_min_length, Some(12));
        assert_eq!(env.log_format, Some(LogFormat::Json));
        Ok(())
    }

    #[test]
    fn invalid_values_fail_fast() {
        assert_eq!(
            EngineEnv::from_map(&env_map(&[(ENV_USERNAME_MAX_LENGTH, "lots")])),
            Err(EnvParseError::InvalidInt {
                var: ENV_USERNAME_MAX_LENGTH,
                value: "lots".to_owned(),
            })
        );
        assert_eq!(
            EngineEnv::from_map(&env_map(&[(ENV_LOG_LEVEL, "   ")])),
            Err(EnvParseError::EmptyValue { var: ENV_LOG_LEVEL })
        );
        assert!(matches!(
            EngineEnv::from_map(&env_map(&[(ENV_LOG_FORMAT, "xml")])),
            Err(EnvParseError::InvalidEnum { .. })
        ));
    }

    #[test]
    fn overrides_are_validated_after_merge() {
        let env = EngineEnv {
            username_min_length: Some(40),
            ..EngineEnv::default()
        };
        let error = apply_env_overrides(EngineConfig::default(), &env).err();
        assert_eq!(
            error.map(|error| error.code),
            Some(ErrorCode::new("config", "invalid_range"))
        );
    }
}
