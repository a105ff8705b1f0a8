//! Rules command handler.

use crate::CliOutput;
use crate::error::{CliError, ExitCode};
use crate::format::{OutputMode, to_json_line};
use payload_guard_config::{ValidatedEngineConfig, build_registry};
use payload_guard_engine::RuleRegistry;
use payload_guard_shared::ErrorEnvelope;

/// List every registered rule with its message template.
pub fn run_rules(mode: OutputMode, config: &ValidatedEngineConfig) -> Result<CliOutput, CliError> {
    let registry = build_registry(config).map_err(ErrorEnvelope::from)?;

    let stdout = if mode.is_json() {
        format_rules_json(&registry)?
    } else {
        format_rules_text(&registry)
    };

    Ok(CliOutput {
        stdout,
        stderr: String::new(),
        exit_code: ExitCode::Ok,
    })
}

fn format_rules_text(registry: &RuleRegistry) -> String {
    let width = registry.iter().map(|rule| rule.name().len()).max().unwrap_or(0);
    registry
        .iter()
        .map(|rule| format!("{:<width$}  {}\n", rule.name(), rule.template().as_str()))
        .collect()
}

fn format_rules_json(registry: &RuleRegistry) -> Result<String, CliError> {
    let rules: Vec<serde_json::Value> = registry
        .iter()
        .map(|rule| {
            serde_json::json!({
                "name": rule.name(),
                "template": rule.template().as_str(),
            })
        })
        .collect();
    let payload = serde_json::json!({
        "status": "ok",
        "count": rules.len(),
        "rules": rules,
    });
    Ok(to_json_line(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_listing_aligns_templates() {
        let output = format_rules_text(&RuleRegistry::with_builtins());
        let required = output
            .lines()
            .find(|line| line.starts_with("required "))
            .unwrap_or_default();

        assert!(required.ends_with("{field} is required"));
        assert!(output.lines().any(|line| line.starts_with("eq_field ")));
    }
}
