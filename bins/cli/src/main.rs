//! CLI binary entrypoint.

mod commands;
mod error;
mod format;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{ValidateCommandInput, run_config_show, run_rules, run_validate};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use payload_guard_adapters::RequestSource;
use payload_guard_config::{LogConfig, LogFormat, ValidatedEngineConfig, load_engine_config_std_env};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Env var holding a tracing filter directive; overrides the configured level.
const LOG_FILTER_ENV: &str = "PGUARD_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "pguard",
    version,
    about = "Declarative request payload validation",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    /// Engine config file (JSON/TOML). `PGUARD_*` env vars apply on top.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered rules and their message templates.
    Rules,
    /// Validate an input against a schema document.
    Validate {
        /// Schema document (JSON/TOML).
        #[arg(long)]
        schema: PathBuf,
        /// Input file, or `-` to read stdin.
        #[arg(long)]
        input: String,
        /// Validate only this field (repeatable). Defaults to every field.
        #[arg(long = "field", value_name = "FIELD")]
        fields: Vec<String>,
        /// Request part the input stands for.
        #[arg(long, value_enum, default_value_t = SourceArg::Body)]
        source: SourceArg,
    },
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Show the effective config after env overrides.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Body,
    Query,
    Params,
    Headers,
}

impl From<SourceArg> for RequestSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Body => Self::Body,
            SourceArg::Query => Self::Query,
            SourceArg::Params => Self::Params,
            SourceArg::Headers => Self::Headers,
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let mode = OutputMode::from_args(&cli.output);

    let config = match load_engine_config_std_env(cli.config.as_deref()) {
        Ok(config) => config,
        Err(envelope) => return exit_with_error(&CliError::from(envelope)),
    };
    init_tracing(&config.log);

    match run(&cli.command, mode, &config) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    tracing::debug!(exit_code = error.exit_code().as_u8(), "command failed");
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode, config: &ValidatedEngineConfig) -> Result<CliOutput, CliError> {
    match command {
        Commands::Rules => run_rules(mode, config),
        Commands::Validate {
            schema,
            input,
            fields,
            source,
        } => run_validate(
            mode,
            config,
            ValidateCommandInput {
                schema,
                input,
                fields,
                source: (*source).into(),
            },
        ),
        Commands::Config { command } => match command {
            ConfigCommands::Show => run_config_show(mode, config),
        },
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&*log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    let installed = match log.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_target(false).try_init(),
    };
    if installed.is_err() {
        let _ = writeln!(io::stderr(), "warning: tracing subscriber already installed");
    }
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.stdout.as_bytes())?;
    stdout.flush()?;
    if !output.stderr.is_empty() {
        io::stderr().write_all(output.stderr.as_bytes())?;
    }
    Ok(())
}
