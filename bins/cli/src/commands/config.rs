//! Config command handlers.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::OutputMode;
use payload_guard_config::{ValidatedEngineConfig, to_pretty_json, to_pretty_toml};

/// Print the effective config: TOML for text output, JSON otherwise.
pub fn run_config_show(mode: OutputMode, config: &ValidatedEngineConfig) -> Result<CliOutput, CliError> {
    let stdout = if mode.is_json() {
        to_pretty_json(config)?
    } else {
        to_pretty_toml(config)?
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}
