//! Engine configuration schema, defaults, validation, and normalization.
//!
//! - Deserialization uses `serde` (JSON or TOML).
//! - Validation is manual and returns typed errors mapped to `ErrorEnvelope`.
//! - Normalization trims names and lowercases the log level.

use payload_guard_engine::{PasswordPolicy, RulePolicies, UsernamePolicy};
use payload_guard_shared::{ErrorCode, ErrorEnvelope, Validated};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Current supported configuration schema version.
pub const CURRENT_CONFIG_VERSION: u32 = 1;

const PASSWORD_MIN_LENGTH_MIN: u32 = 1;
const PASSWORD_MIN_LENGTH_MAX: u32 = 1_024;
const USERNAME_LENGTH_MIN: u32 = 1;
const USERNAME_LENGTH_MAX: u32 = 256;
const MESSAGE_TEMPLATE_MAX_CHARS: usize = 512;
const MESSAGES_MAX: usize = 256;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validated engine configuration.
pub type ValidatedEngineConfig = Validated<EngineConfig>;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct EngineConfig {
    /// Schema version for forward-compatible migrations.
    pub version: u32,
    /// Password rule policy.
    pub password: PasswordConfig,
    /// Username rule policy.
    pub username: UsernameConfig,
    /// Message template overrides keyed by rule name.
    pub messages: BTreeMap<String, String>,
    /// Logging settings for binaries embedding the engine.
    pub log: LogConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_CONFIG_VERSION,
            password: PasswordConfig::default(),
            username: UsernameConfig::default(),
            messages: BTreeMap::new(),
            log: LogConfig::default(),
        }
    }
}

/// Password policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct PasswordConfig {
    /// Minimum length in characters.
    pub min_length: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

/// Username policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct UsernameConfig {
    /// Minimum length, inclusive.
    pub min_length: u32,
    /// Maximum length, inclusive.
    pub max_length: u32,
}

impl Default for UsernameConfig {
    fn default() -> Self {
        Self {
            min_length: 3,
            max_length: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parse a format name (case-insensitive).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct LogConfig {
    /// Default level when no filter directive is set.
    pub level: Box<str>,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

impl EngineConfig {
    /// Validate and normalize the config.
    pub fn validate_and_normalize(mut self) -> Result<ValidatedEngineConfig, ConfigSchemaError> {
        self.validate_version()?;
        self.validate_password()?;
        self.validate_username()?;
        self.normalize_messages()?;
        self.normalize_log()?;
        Ok(Validated::new(self))
    }

    /// Rule policies used to seed the standard registry.
    #[must_use]
    pub fn rule_policies(&self) -> RulePolicies {
        RulePolicies {
            password: PasswordPolicy {
                min_length: self.password.min_length as usize,
            },
            username: UsernamePolicy {
                min_length: self.username.min_length as usize,
                max_length: self.username.max_length as usize,
            },
            messages: self.messages.clone(),
        }
    }

    const fn validate_version(&self) -> Result<(), ConfigSchemaError> {
        if self.version != CURRENT_CONFIG_VERSION {
            return Err(ConfigSchemaError::UnsupportedVersion {
                found: self.version,
                supported: CURRENT_CONFIG_VERSION,
            });
        }
        Ok(())
    }

    const fn validate_password(&self) -> Result<(), ConfigSchemaError> {
        check_limit(
            "password",
            "minLength",
            self.password.min_length,
            PASSWORD_MIN_LENGTH_MIN,
            PASSWORD_MIN_LENGTH_MAX,
        )
    }

    fn validate_username(&self) -> Result<(), ConfigSchemaError> {
        let username = &self.username;
        check_limit(
            "username",
            "minLength",
            username.min_length,
            USERNAME_LENGTH_MIN,
            USERNAME_LENGTH_MAX,
        )?;
        check_limit(
            "username",
            "maxLength",
            username.max_length,
            USERNAME_LENGTH_MIN,
            USERNAME_LENGTH_MAX,
        )?;
        if username.min_length > username.max_length {
            return Err(ConfigSchemaError::InvalidRange {
                section: "username",
                min_field: "minLength",
                max_field: "maxLength",
                min: username.min_length,
                max: username.max_length,
            });
        }
        Ok(())
    }

    fn normalize_messages(&mut self) -> Result<(), ConfigSchemaError> {
        if self.messages.len() > MESSAGES_MAX {
            return Err(ConfigSchemaError::TooManyMessages {
                len: self.messages.len(),
                max: MESSAGES_MAX,
            });
        }

        let mut normalized = BTreeMap::new();
        for (rule, template) in std::mem::take(&mut self.messages) {
            let rule = rule.trim().to_owned();
            if rule.is_empty() {
                return Err(ConfigSchemaError::InvalidMessage {
                    rule,
                    reason: "rule name must be non-empty",
                });
            }
            if template.trim().is_empty() {
                return Err(ConfigSchemaError::InvalidMessage {
                    rule,
                    reason: "template must be non-empty",
                });
            }
            if template.chars().count() > MESSAGE_TEMPLATE_MAX_CHARS {
                return Err(ConfigSchemaError::InvalidMessage {
                    rule,
                    reason: "template is too long",
                });
            }
            if normalized.insert(rule.clone(), template).is_some() {
                return Err(ConfigSchemaError::InvalidMessage {
                    rule,
                    reason: "rule name appears more than once after trimming",
                });
            }
        }
        self.messages = normalized;
        Ok(())
    }

    fn normalize_log(&mut self) -> Result<(), ConfigSchemaError> {
        let level = self.log.level.trim().to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigSchemaError::InvalidLogLevel {
                value: self.log.level.to_string(),
            });
        }
        self.log.level = level.into_boxed_str();
        Ok(())
    }
}

const fn check_limit(
    section: &'static str,
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> Result<(), ConfigSchemaError> {
    if value < min || value > max {
        return Err(ConfigSchemaError::LimitOutOfRange {
            section,
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Validation failures for engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSchemaError {
    /// The config version is not supported by this binary.
    UnsupportedVersion {
        /// Version found in the config.
        found: u32,
        /// Version supported by this crate.
        supported: u32,
    },
    /// A numeric limit is out of bounds.
    LimitOutOfRange {
        /// Schema section (e.g. `password`).
        section: &'static str,
        /// Field name in the config file (e.g. `minLength`).
        field: &'static str,
        /// Value provided.
        value: u32,
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
    },
    /// A lower bound exceeds its upper bound.
    InvalidRange {
        /// Schema section.
        section: &'static str,
        /// Lower-bound field name.
        min_field: &'static str,
        /// Upper-bound field name.
        max_field: &'static str,
        /// Lower bound provided.
        min: u32,
        /// Upper bound provided.
        max: u32,
    },
    /// Too many message overrides.
    TooManyMessages {
        /// Number of entries.
        len: usize,
        /// Maximum allowed entries.
        max: usize,
    },
    /// A message override is unusable.
    InvalidMessage {
        /// Rule name as written.
        rule: String,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// The log level is not recognised.
    InvalidLogLevel {
        /// Raw input value.
        value: String,
    },
}

impl ConfigSchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnsupportedVersion { .. } => ErrorCode::new("config", "unsupported_version"),
            Self::LimitOutOfRange { .. } => ErrorCode::new("config", "invalid_limit"),
            Self::InvalidRange { .. } => ErrorCode::new("config", "invalid_range"),
            Self::TooManyMessages { .. } | Self::InvalidMessage { .. } => {
                ErrorCode::new("config", "invalid_message")
            },
            Self::InvalidLogLevel { .. } => ErrorCode::new("config", "invalid_log_level"),
        }
    }
}

impl fmt::Display for ConfigSchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion { found, supported } => {
                write!(
                    formatter,
                    "unsupported config version: {found} (supported: {supported})"
                )
            },
            Self::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{field} must be within [{min}, {max}] (got {value})"
            ),
            Self::InvalidRange {
                section,
                min_field,
                max_field,
                min,
                max,
            } => write!(
                formatter,
                "{section}.{min_field} ({min}) must not exceed {section}.{max_field} ({max})"
            ),
            Self::TooManyMessages { len, max } => {
                write!(formatter, "messages is too large ({len} entries, max {max})")
            },
            Self::InvalidMessage { rule, reason } => {
                write!(formatter, "messages.{rule}: {reason}")
            },
            Self::InvalidLogLevel { value } => write!(
                formatter,
                "log.level `{value}` is not one of {}",
                LOG_LEVELS.join(", ")
            ),
        }
    }
}

impl std::error::Error for ConfigSchemaError {}

impl From<ConfigSchemaError> for ErrorEnvelope {
    fn from(error: ConfigSchemaError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        let mut envelope = Self::expected(code, message);

        match error {
            ConfigSchemaError::UnsupportedVersion { found, supported } => {
                envelope = envelope
                    .with_metadata("found", found.to_string())
                    .with_metadata("supported", supported.to_string());
            },
            ConfigSchemaError::LimitOutOfRange {
                section,
                field,
                value,
                min,
                max,
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("field", field)
                    .with_metadata("value", value.to_string())
                    .with_metadata("min", min.to_string())
                    .with_metadata("max", max.to_string());
            },
            ConfigSchemaError::InvalidRange {
                section,
                min_field,
                max_field,
                ..
            } => {
                envelope = envelope
                    .with_metadata("section", section)
                    .with_metadata("min_field", min_field)
                    .with_metadata("max_field", max_field);
            },
            ConfigSchemaError::TooManyMessages { len, max } => {
                envelope = envelope
                    .with_metadata("len", len.to_string())
                    .with_metadata("max", max.to_string());
            },
            ConfigSchemaError::InvalidMessage { rule, .. } => {
                envelope = envelope.with_metadata("rule", rule);
            },
            ConfigSchemaError::InvalidLogLevel { value } => {
                envelope = envelope.with_metadata("value", value);
            },
        }

        envelope
    }
}

/// Parse an engine config from a JSON string, applying validation and normalization.
pub fn parse_engine_config_json(input: &str) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config: EngineConfig = serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}

/// Parse an engine config from a TOML string, applying validation and normalization.
pub fn parse_engine_config_toml(input: &str) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config: EngineConfig = toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
    })?;

    config.validate_and_normalize().map_err(Into::into)
}
