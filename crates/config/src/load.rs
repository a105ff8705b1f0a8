//! Config and schema loading helpers (file + env).
//!
//! The loader is responsible for deterministic merge order and surfacing
//! user-facing errors as typed `ErrorEnvelope`s.

use crate::{EngineConfig, EngineEnv, ValidatedEngineConfig, apply_env_overrides};
use payload_guard_engine::SchemaDocument;
use payload_guard_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use serde::de::DeserializeOwned;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Toml,
}

/// Load the engine config from an optional file path.
///
/// Precedence (highest wins):
/// - env overrides (`EngineEnv`)
/// - config file (JSON or TOML by extension)
/// - defaults (`EngineConfig::default()`)
pub fn load_engine_config_from_path(
    config_path: Option<&Path>,
    env: &EngineEnv,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let config = match config_path {
        None => EngineConfig::default(),
        Some(path) => {
            let text = read_source_file(path, "config")?;
            let format = detect_file_format(path, "config")?;
            parse_unvalidated(&text, format, "config")?
        },
    };

    // env is applied last and also validates/normalizes the resulting config.
    let config = apply_env_overrides(config, env)?;
    tracing::debug!(
        path = %config_path.map_or_else(|| String::from("<defaults>"), |path| path.display().to_string()),
        env_overrides = !env.is_empty(),
        "engine config loaded"
    );
    Ok(config)
}

/// Load the engine config from std env and an optional file path.
pub fn load_engine_config_std_env(
    config_path: Option<&Path>,
) -> Result<ValidatedEngineConfig, ErrorEnvelope> {
    let env = EngineEnv::from_std_env().map_err(ErrorEnvelope::from)?;
    load_engine_config_from_path(config_path, &env)
}

/// Load a shape schema document (JSON or TOML by extension).
pub fn load_schema_from_path(path: &Path) -> Result<SchemaDocument, ErrorEnvelope> {
    let text = read_source_file(path, "schema")?;
    let format = detect_file_format(path, "schema")?;
    parse_unvalidated(&text, format, "schema")
}

/// Serialize the config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &EngineConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

/// Serialize the config as deterministic pretty TOML (with trailing newline).
pub fn to_pretty_toml(config: &EngineConfig) -> Result<String, ErrorEnvelope> {
    let mut output = toml::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::new("config", "serialize_toml"),
            format!("failed to serialize config TOML: {error}"),
            ErrorClass::NonRetriable,
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn parse_unvalidated<T: DeserializeOwned>(
    input: &str,
    format: FileFormat,
    source: &'static str,
) -> Result<T, ErrorEnvelope> {
    match format {
        FileFormat::Json => serde_json::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_json"),
                format!("invalid {source} JSON: {error}"),
            )
            .with_metadata("source", source)
        }),
        FileFormat::Toml => toml::from_str(input).map_err(|error| {
            ErrorEnvelope::expected(
                ErrorCode::new("config", "invalid_toml"),
                format!("invalid {source} TOML: {error}"),
            )
            .with_metadata("source", source)
        }),
    }
}

fn read_source_file(path: &Path, source: &'static str) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", format!("{source}_file_not_found")),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", format!("{source}_file_permission_denied"))
            },
            _ => ErrorCode::new("config", format!("{source}_file_io")),
        };

        ErrorEnvelope::expected(code, format!("failed to read {source} file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_file_format(path: &Path, source: &'static str) -> Result<FileFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        None | Some("json") => Ok(FileFormat::Json),
        Some("toml") => Ok(FileFormat::Toml),
        Some(other) => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            format!("unsupported {source} format; use .json or .toml"),
        )
        .with_metadata("extension", other.to_string())),
    }
}
