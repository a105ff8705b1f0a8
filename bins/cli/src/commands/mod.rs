//! CLI command handlers.

pub mod config;
pub mod rules;
pub mod validate;

pub use config::run_config_show;
pub use rules::run_rules;
pub use validate::{ValidateCommandInput, run_validate};
