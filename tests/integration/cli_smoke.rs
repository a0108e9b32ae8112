#![allow(missing_docs)]

//! CLI smoke tests: argument parsing and config resolution, no engine.

use std::io::Write;

use assert_cmd::Command;

fn redify() -> Command {
    let mut cmd = Command::cargo_bin("redify").expect("binary builds");
    // Keep host environment out of the resolution chain.
    cmd.env_remove("REDIFY_CONFIG")
        .env_remove("REDIFY_HOST")
        .env_remove("REDIFY_PORT")
        .env_remove("REDIFY_BOLT_URI")
        .env_remove("REDIFY_BOLT_USER")
        .env_remove("REDIFY_BOLT_PASSWORD");
    cmd
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn help_lists_subcommands() {
    let assert = redify().arg("--help").assert().success();
    let stdout = stdout_of(assert);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("check-config"));
}

#[test]
fn check_config_requires_a_password() {
    let assert = redify().arg("check-config").assert().failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf-8 stderr");
    assert!(stderr.contains("password"));
}

#[test]
fn check_config_resolves_flags() {
    let assert = redify()
        .args([
            "check-config",
            "--port",
            "9000",
            "--bolt-uri",
            "bolt://graph:7687",
            "--bolt-password",
            "secret",
        ])
        .assert()
        .success();
    let stdout = stdout_of(assert);
    assert!(stdout.contains("9000"));
    assert!(stdout.contains("bolt://graph:7687"));
    // The password itself never echoes back.
    assert!(!stdout.contains("secret"));
}

#[test]
fn check_config_reads_a_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "[http]\nport = 9100\n\n[neo4j]\npassword = \"from-file\"\n"
    )
    .unwrap();

    let assert = redify()
        .args(["--config", file.path().to_str().unwrap(), "check-config"])
        .assert()
        .success();
    assert!(stdout_of(assert).contains("9100"));
}
