//! Validate command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use payload_guard_adapters::{
    Rejection, RequestData, RequestGuard, RequestSource, parse_query_string,
};
use payload_guard_api::v1::summarize;
use payload_guard_config::{ValidatedEngineConfig, build_validator, load_schema_from_path};
use payload_guard_shared::ErrorEnvelope;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

/// Arguments of `pguard validate`.
#[derive(Debug, Clone, Copy)]
pub struct ValidateCommandInput<'a> {
    /// Schema document (JSON or TOML).
    pub schema: &'a Path,
    /// Input file, or `-` for stdin.
    pub input: &'a str,
    /// Fields to validate; empty validates every field.
    pub fields: &'a [String],
    /// Request part the input stands for.
    pub source: RequestSource,
}

/// Validate one input against a schema document.
///
/// A rejected payload is not a command failure: the envelope is printed and
/// the exit code is [`ExitCode::Rejected`].
pub fn run_validate(
    mode: OutputMode,
    config: &ValidatedEngineConfig,
    input: ValidateCommandInput<'_>,
) -> Result<CliOutput, CliError> {
    let document = load_schema_from_path(input.schema)?;
    let validator = build_validator(config).map_err(ErrorEnvelope::from)?;
    let shape = validator
        .resolve(&document.to_declaration())
        .map_err(|error| CliError::InvalidInput(format!("schema `{}`: {error}", document.name)))?;

    let request = read_request(input.input, input.source)?;
    let fields: Vec<&str> = input.fields.iter().map(String::as_str).collect();
    let guard = RequestGuard::new(Arc::new(validator));

    match guard.validate_dynamic(&shape, input.source, &request, &fields) {
        Ok(_) => {
            let stdout = if mode.is_json() {
                to_json_line(&serde_json::json!({
                    "status": "valid",
                    "schema": document.name,
                    "source": input.source.target().as_str(),
                }))?
            } else {
                format!("status: valid\nschema: {}\n", document.name)
            };
            Ok(CliOutput {
                stdout,
                stderr: String::new(),
                exit_code: ExitCode::Ok,
            })
        },
        Err(rejection) => format_rejection(mode, &rejection),
    }
}

fn format_rejection(mode: OutputMode, rejection: &Rejection) -> Result<CliOutput, CliError> {
    let envelope = rejection.envelope();
    let stdout = if mode.is_json() {
        to_json_line(&serde_json::json!({
            "status": "rejected",
            "error": envelope,
        }))?
    } else {
        let mut text = format!(
            "status: rejected\nhttp: {}\nerror: {}\nmessage: {}\n",
            envelope.status, envelope.error, envelope.message
        );
        for (field, message) in envelope.details.iter().flatten() {
            text.push_str(&format!("  {field}: {message}\n"));
        }
        text
    };

    Ok(CliOutput {
        stdout,
        stderr: format!("{}\n", summarize(envelope)),
        exit_code: ExitCode::Rejected,
    })
}

fn read_request(input: &str, source: RequestSource) -> Result<RequestData, CliError> {
    let raw = read_input(input)?;
    if source == RequestSource::Body {
        return Ok(RequestData::new().with_body(raw));
    }

    let text = String::from_utf8(raw)
        .map_err(|_| CliError::InvalidInput(format!("{source} input is not valid UTF-8")))?;
    let request = match source {
        RequestSource::Query | RequestSource::Body => RequestData::new().with_query_string(&text),
        RequestSource::Params => parse_query_string(&text)
            .into_iter()
            .fold(RequestData::new(), |request, (key, value)| request.with_param(key, value)),
        RequestSource::Headers => parse_header_lines(&text)?
            .into_iter()
            .fold(RequestData::new(), |request, (name, value)| {
                request.with_header(name, value)
            }),
    };
    Ok(request)
}

fn read_input(input: &str) -> Result<Vec<u8>, CliError> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read(input)?)
}

/// `Name: value` per line; blank lines are skipped.
fn parse_header_lines(text: &str) -> Result<Vec<(&str, &str)>, CliError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim(), value.trim()))
                .filter(|(name, _)| !name.is_empty())
                .ok_or_else(|| CliError::InvalidInput(format!("malformed header line `{line}`")))
        })
        .collect()
}
