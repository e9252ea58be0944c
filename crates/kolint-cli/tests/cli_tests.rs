//! End-to-end tests for the kolint binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const CLEAN: &str = "fun main() {\n    println(\"hi\")\n}\n";
const MESSY: &str = "fun main() {\nprintln(\"hi\")\n}\n";

#[allow(deprecated)]
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("kolint").unwrap();
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (name, content) in files {
        let path = temp.path().join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    temp
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("fix"));
}

#[test]
fn test_version_command() {
    cli()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(VERSION));
}

#[test]
fn test_check_clean_project() {
    let temp = project(&[("src/Main.kt", CLEAN)]);
    cli()
        .arg("check")
        .arg(temp.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Checked 1 file"))
        .stdout(predicate::str::contains("no issues found"));
}

#[test]
fn test_check_reports_violations() {
    let temp = project(&[("Main.kt", MESSY)]);
    let file = temp.path().join("Main.kt");
    let expected = format!(
        "{}:2:1: warning[style/indentation] expected 4 but was 0",
        file.display()
    );
    cli()
        .args(["--no-color", "check"])
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains(expected))
        .stdout(predicate::str::contains("1 warning"));
    assert_eq!(read(temp.path(), "Main.kt"), MESSY);
}

#[test]
fn test_check_json_output() {
    let temp = project(&[("Main.kt", MESSY)]);
    let output = cli()
        .args(["--format", "json", "check"])
        .arg(temp.path())
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let reports: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diagnostics = &reports[0]["diagnostics"];
    assert_eq!(diagnostics.as_array().unwrap().len(), 1);
    assert_eq!(diagnostics[0]["line"], 2);
    assert_eq!(diagnostics[0]["ruleId"], "style/indentation");
    assert_eq!(diagnostics[0]["severity"], "warning");
    assert_eq!(diagnostics[0]["autoFixable"], true);
}

#[test]
fn test_fix_rewrites_files() {
    let temp = project(&[("Main.kt", MESSY), ("Other.kt", CLEAN)]);
    cli()
        .arg("fix")
        .arg(temp.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Fixed"))
        .stdout(predicate::str::contains("1 of 2 files changed"));
    assert_eq!(read(temp.path(), "Main.kt"), CLEAN);
    assert_eq!(read(temp.path(), "Other.kt"), CLEAN);

    cli().arg("check").arg(temp.path()).assert().code(0);
}

#[test]
fn test_fix_dry_run_prints_diff() {
    let temp = project(&[("Main.kt", MESSY)]);
    cli()
        .args(["fix", "--dry-run"])
        .arg(temp.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("-println(\"hi\")"))
        .stdout(predicate::str::contains("+    println(\"hi\")"))
        .stdout(predicate::str::contains("Would fix"));
    assert_eq!(read(temp.path(), "Main.kt"), MESSY);
}

#[test]
fn test_fix_adds_missing_final_newline() {
    let temp = project(&[("Main.kt", "val a = 1")]);
    cli().arg("fix").arg(temp.path()).assert().code(0);
    assert_eq!(read(temp.path(), "Main.kt"), "val a = 1\n");
}

#[test]
fn test_rules_command() {
    cli()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("style/indentation"));
}

#[test]
fn test_rules_json() {
    let output = cli().args(["--format", "json", "rules"]).output().unwrap();
    assert!(output.status.success());
    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rules[0]["id"], "style/indentation");
    assert_eq!(rules[0]["enabled"], true);
}

#[test]
fn test_missing_config_file_fails() {
    let temp = project(&[("Main.kt", CLEAN)]);
    cli()
        .arg("--config")
        .arg(temp.path().join("missing.toml"))
        .arg("check")
        .arg(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn test_config_turns_rule_off() {
    let temp = project(&[
        ("Main.kt", MESSY),
        ("kolint.toml", "root = true\n[rules.\"style/indentation\"]\nseverity = \"off\"\n"),
    ]);
    cli().arg("check").arg(temp.path()).assert().code(0);
}

#[test]
fn test_config_sets_indentation_size() {
    let temp = project(&[
        ("Main.kt", "fun main() {\n  println(\"hi\")\n}\n"),
        (
            "kolint.toml",
            "root = true\n[rules.\"style/indentation\".options]\nindentationSize = 2\n",
        ),
    ]);
    cli().arg("check").arg(temp.path()).assert().code(0);
}

#[test]
fn test_empty_directory() {
    let temp = TempDir::new().unwrap();
    cli()
        .arg("check")
        .arg(temp.path())
        .assert()
        .code(0)
        .stdout(predicate::str::contains("No Kotlin files found"));
}
