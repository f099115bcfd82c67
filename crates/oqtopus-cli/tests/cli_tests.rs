//! End-to-end tests of the `oqtopus` binary.
//!
//! These only cover paths that need no OQTOPUS Cloud connection.

use std::io::Write;
use std::process::{Command, Output};

fn oqtopus(args: &[&str], home: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_oqtopus"))
        .args(args)
        .env("HOME", home)
        .env_remove("OQTOPUS_URL")
        .env_remove("OQTOPUS_API_TOKEN")
        .env_remove("OQTOPUS_PROXY")
        .env_remove("OQTOPUS_PROFILE")
        .output()
        .expect("failed to run oqtopus")
}

#[test]
fn test_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = oqtopus(&["--help"], home.path());
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["devices", "sample", "estimate", "status", "wait", "result", "cancel"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_version() {
    let home = tempfile::tempdir().unwrap();
    let output = oqtopus(&["--version"], home.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_configuration_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = oqtopus(&["devices"], home.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No OQTOPUS configuration found"));
}

#[test]
fn test_missing_profile_fails() {
    let home = tempfile::tempdir().unwrap();
    let mut config = tempfile::NamedTempFile::new().unwrap();
    write!(config, "[default]\nurl=http://127.0.0.1:9\napi_token=t\n").unwrap();

    let path = config.path().to_string_lossy().into_owned();
    let output = oqtopus(
        &["status", "job-1", "--config", &path, "--profile", "nope"],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load configuration"));
}

#[test]
fn test_missing_qasm_file_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = oqtopus(
        &["sample", "-i", "/nonexistent/bell.qasm", "-d", "SC"],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("File not found"));
}

#[test]
fn test_bad_operator_term_fails() {
    let home = tempfile::tempdir().unwrap();
    let mut qasm = tempfile::NamedTempFile::new().unwrap();
    write!(qasm, "OPENQASM 3;\nqubit[1] q;\nh q[0];").unwrap();

    let path = qasm.path().to_string_lossy().into_owned();
    let output = oqtopus(
        &["estimate", "-i", &path, "-o", "X0", "-d", "SC"],
        home.path(),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("expected PAULI=COEFF"));
}
