//! `pguard config show` and `pguard rules` end-to-end tests.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn config_fixture(name: &str) -> Result<PathBuf, Box<dyn Error>> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(Path::parent)
        .ok_or("workspace root not found")?;
    Ok(root.join("tests").join("fixtures").join("config").join(name))
}

fn pguard(args: &[&str]) -> std::io::Result<Output> {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pguard"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("PGUARD_") {
            command.env_remove(key);
        }
    }
    command.output()
}

#[test]
fn default_config_matches_fixture() -> Result<(), Box<dyn Error>> {
    let output = pguard(&["config", "show", "--output", "json"])?;
    let expected = std::fs::read_to_string(config_fixture("engine-config.default.json")?)?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
    Ok(())
}

#[test]
fn config_file_is_normalized() -> Result<(), Box<dyn Error>> {
    let path = config_fixture("engine-config.valid.toml")?;
    let output = pguard(&[
        "config",
        "show",
        "--config",
        path.to_str().ok_or("non-utf8 path")?,
        "--output",
        "json",
    ])?;
    assert_eq!(output.status.code(), Some(0));

    let config: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(config["password"]["minLength"], 10);
    assert_eq!(config["log"]["level"], "debug");
    assert_eq!(config["messages"]["required"], "{field} cannot be blank");
    Ok(())
}

#[test]
fn invalid_config_is_invalid_input() -> Result<(), Box<dyn Error>> {
    let path = config_fixture("engine-config.invalid-range.json")?;
    let output = pguard(&["rules", "--config", path.to_str().ok_or("non-utf8 path")?])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config:invalid_range"));
    Ok(())
}

#[test]
fn missing_config_is_an_io_error() -> Result<(), Box<dyn Error>> {
    let path = config_fixture("does-not-exist.toml")?;
    let output = pguard(&["rules", "--config", path.to_str().ok_or("non-utf8 path")?])?;

    assert_eq!(output.status.code(), Some(3));
    Ok(())
}

#[test]
fn rules_lists_builtin_and_service_rules() -> Result<(), Box<dyn Error>> {
    let output = pguard(&["rules", "--output", "json"])?;
    assert_eq!(output.status.code(), Some(0));

    let payload: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    let names: Vec<&str> = payload["rules"]
        .as_array()
        .ok_or("rules is not an array")?
        .iter()
        .filter_map(|rule| rule["name"].as_str())
        .collect();

    for expected in ["required", "email", "eq_field", "password", "username", "slug"] {
        assert!(names.contains(&expected), "missing rule {expected}");
    }
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "rules are listed by name");
    Ok(())
}

#[test]
fn message_overrides_show_in_rule_listing() -> Result<(), Box<dyn Error>> {
    let path = config_fixture("engine-config.valid.toml")?;
    let output = pguard(&["rules", "--config", path.to_str().ok_or("non-utf8 path")?])?;
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let required = stdout
        .lines()
        .find(|line| line.starts_with("required "))
        .ok_or("required rule missing")?;
    assert!(required.ends_with("{field} cannot be blank"));
    Ok(())
}
