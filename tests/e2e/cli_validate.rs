//! `pguard validate` end-to-end tests.

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn fixtures() -> Result<PathBuf, Box<dyn Error>> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let root = manifest_dir
        .parent()
        .and_then(Path::parent)
        .ok_or("workspace root not found")?;
    Ok(root.join("tests").join("fixtures"))
}

fn pguard(args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_pguard"));
    command.args(args);
    for (key, _) in std::env::vars() {
        if key.starts_with("PGUARD_") {
            command.env_remove(key);
        }
    }
    command
}

fn validate(schema: &str, input: &str, extra: &[&str]) -> Result<Output, Box<dyn Error>> {
    let fixtures = fixtures()?;
    let schema = fixtures.join("schemas").join(schema);
    let input = fixtures.join("inputs").join(input);
    let schema = schema.to_str().ok_or("non-utf8 path")?;
    let input = input.to_str().ok_or("non-utf8 path")?;

    let mut args = vec!["validate", "--schema", schema, "--input", input];
    args.extend_from_slice(extra);
    Ok(pguard(&args).output()?)
}

fn stdout_json(output: &Output) -> Result<serde_json::Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn valid_payload_exits_zero() -> Result<(), Box<dyn Error>> {
    let output = validate("signup.toml", "signup.valid.json", &[])?;

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "status: valid\nschema: Signup\n"
    );
    Ok(())
}

#[test]
fn rejected_payload_prints_the_envelope() -> Result<(), Box<dyn Error>> {
    let output = validate("signup.toml", "signup.mismatch.json", &["--output", "json"])?;
    assert_eq!(output.status.code(), Some(4));

    let payload = stdout_json(&output)?;
    assert_eq!(payload["status"], "rejected");
    assert_eq!(payload["error"]["status"], 422);
    assert_eq!(payload["error"]["message"], "Request body validation failed");
    assert_eq!(
        payload["error"]["details"]["confirmPassword"],
        "confirmPassword must match password"
    );
    assert_eq!(
        payload["error"]["details"]["email"],
        "email must be a valid email address"
    );
    assert!(payload["error"]["details"].get("password").is_none());
    Ok(())
}

#[test]
fn selected_fields_limit_validation() -> Result<(), Box<dyn Error>> {
    let output = validate(
        "signup.toml",
        "signup.mismatch.json",
        &["--field", "username", "--field", "password"],
    )?;
    assert_eq!(output.status.code(), Some(0));

    let output = validate(
        "signup.toml",
        "signup.mismatch.json",
        &["--field", "nickname", "--output", "json"],
    )?;
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout_json(&output)?["error"]["details"]["nickname"], "field not found");
    Ok(())
}

#[test]
fn malformed_body_is_a_parse_rejection() -> Result<(), Box<dyn Error>> {
    let output = validate("signup.toml", "signup.malformed.json", &["--output", "json"])?;
    assert_eq!(output.status.code(), Some(4));

    let payload = stdout_json(&output)?;
    assert_eq!(payload["error"]["status"], 400);
    assert_eq!(payload["error"]["error"], "Invalid request body");
    assert!(payload["error"]["details"]["general"].is_string());
    Ok(())
}

#[test]
fn query_input_binds_by_name() -> Result<(), Box<dyn Error>> {
    let output = validate(
        "list-query.json",
        "list-query.txt",
        &["--source", "query", "--output", "json"],
    )?;
    assert_eq!(output.status.code(), Some(4));

    let payload = stdout_json(&output)?;
    assert_eq!(payload["error"]["message"], "Query parameter validation failed");
    assert_eq!(
        payload["error"]["details"]["per_page"],
        "per_page must be less than or equal to 100"
    );
    assert!(payload["error"]["details"].get("status").is_none());
    Ok(())
}

#[test]
fn unknown_rule_in_schema_is_invalid_input() -> Result<(), Box<dyn Error>> {
    let output = validate("broken.toml", "signup.valid.json", &[])?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("emial"));
    Ok(())
}

#[test]
fn missing_input_file_is_an_io_error() -> Result<(), Box<dyn Error>> {
    let output = validate("signup.toml", "does-not-exist.json", &[])?;
    assert_eq!(output.status.code(), Some(3));
    Ok(())
}

#[test]
fn stdin_input_is_supported() -> Result<(), Box<dyn Error>> {
    let fixtures = fixtures()?;
    let schema = fixtures.join("schemas").join("signup.toml");
    let body = std::fs::read(fixtures.join("inputs").join("signup.valid.json"))?;

    let mut child = pguard(&[
        "validate",
        "--schema",
        schema.to_str().ok_or("non-utf8 path")?,
        "--input",
        "-",
    ])
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()?;
    child.stdin.take().ok_or("stdin not piped")?.write_all(&body)?;
    let output = child.wait_with_output()?;

    assert_eq!(output.status.code(), Some(0));
    Ok(())
}

#[test]
fn config_policies_reach_the_rules() -> Result<(), Box<dyn Error>> {
    let fixtures = fixtures()?;
    let schema = fixtures.join("schemas").join("signup.toml");
    let input = fixtures.join("inputs").join("signup.valid.json");

    // "Abc12345!" is nine characters; a twelve character minimum rejects it.
    let output = pguard(&[
        "validate",
        "--schema",
        schema.to_str().ok_or("non-utf8 path")?,
        "--input",
        input.to_str().ok_or("non-utf8 path")?,
        "--output",
        "json",
    ])
    .env("PGUARD_PASSWORD_MIN_LENGTH", "12")
    .output()?;

    assert_eq!(output.status.code(), Some(4));
    let details = &stdout_json(&output)?["error"]["details"];
    assert!(
        details["password"]
            .as_str()
            .is_some_and(|message| message.contains("at least 12 characters"))
    );
    Ok(())
}
