//! End-to-end tests for the `validate` command.
//!
//! These tests invoke the actual CLI binary and check the behavior of the
//! `validate` subcommand from a user's perspective.

mod common;

use common::prelude::*;

#[test]
fn test_validate_lists_entries() {
    let fixture = TestFixture::new().with_config(&config(&[
        entry_with_mode(LIB_A, "libs/a", "v2.0", &["v1.0", "v1.5"], "strict"),
        entry(LIB_B, "libs/b", "v3", &[]),
    ]));

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries (2)"))
        .stdout(predicate::str::contains(format!("{} @ v2.0 (strict)", LIB_A)))
        .stdout(predicate::str::contains(format!("{} @ v3 (permissive)", LIB_B)))
        .stdout(predicate::str::contains("compatible: v1.0, v1.5"))
        .stdout(predicate::str::contains("2 unique repositories"));
}

#[test]
fn test_validate_empty_config() {
    let fixture = TestFixture::new().with_config("[]");

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries (0)"))
        .stdout(predicate::str::contains("no dependencies listed"));
}

#[test]
fn test_validate_uses_mode_flag_as_default() {
    let fixture = TestFixture::new().with_config(&config(&[entry(LIB_A, "libs/a", "v1", &[])]));

    fixture
        .command()
        .args(["--color", "never", "validate", "--mode", "strict"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{} @ v1 (strict)", LIB_A)));
}

#[test]
fn test_validate_reads_config_from_environment() {
    let fixture = TestFixture::new().with_file(
        "deps.yaml",
        "- url: https://example.com/org/lib-a.git\n  basePath: libs/a\n  pinnedTag: v1\n",
    );

    fixture
        .command()
        .env("REPO_PIN_CONFIG", fixture.path().join("deps.yaml"))
        .args(["--color", "never", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries (1)"));
}

#[test]
fn test_validate_rejects_unknown_field() {
    let fixture = TestFixture::new().with_config(
        r#"[{"url": "https://example.com/org/lib-a.git", "base_path": "a", "tag": "v1", "ref": "main"}]"#,
    );

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Configuration parsing failed"))
        .stdout(predicate::str::contains("unknown field"));
}

#[test]
fn test_validate_reports_path_conflict() {
    let fixture = TestFixture::new().with_config(&config(&[
        entry(LIB_A, "libs/a", "v1", &[]),
        entry(LIB_A, "vendor/a", "v1", &[]),
    ]));

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Path conflict"))
        .stderr(predicate::str::contains("1 unresolvable request(s)"));
}

#[test]
fn test_validate_missing_file() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["validate", "--config", "missing.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found"));
}
