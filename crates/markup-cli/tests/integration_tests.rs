//! End-to-end tests for the `markup` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[allow(deprecated)]
fn cli() -> Command {
    let mut command = Command::cargo_bin("markup").unwrap();
    command.arg("--no-color");
    command
}

fn create_test_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("Main.xaml"),
        "<Window Title=\"Main\">\n  <Grid/>\n</Window>\n",
    )
    .unwrap();
    fs::write(temp_dir.path().join("data.xml"), "<?xml version=\"1.0\"?>\n<data>&amp;</data>\n").unwrap();
    fs::write(temp_dir.path().join("README.txt"), "<not parsed").unwrap();
    temp_dir
}

#[test]
fn test_help_command() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lossless syntax trees"))
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"));
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
fn test_parse_clean_project() {
    let temp_dir = create_test_project();
    cli()
        .args(["parse", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files checked: 2"))
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn test_parse_reports_errors() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("broken.xml");
    fs::write(&file, "<a>\n<b></a>").unwrap();

    cli()
        .args(["parse", file.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("broken.xml:2:4: error[ML2006]"))
        .stdout(predicate::str::contains("Errors: 1"));
}

#[test]
fn test_parse_json_format() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("dup.xml");
    fs::write(&file, "<a x=\"1\" x=\"2\"/>").unwrap();

    let output = cli()
        .args(["parse", "--format", "json", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files"][0]["diagnostics"][0]["code"], "ML2009");
    assert_eq!(value["summary"]["files_checked"], 1);
}

#[test]
fn test_parse_script_flag() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("fragment.xml");
    fs::write(&file, "Hello <b>world</b>").unwrap();

    cli().args(["parse", file.to_str().unwrap()]).assert().code(1);
    cli()
        .args(["parse", "--script", file.to_str().unwrap()])
        .assert()
        .success();
}

#[test]
fn test_config_file_is_discovered() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join(".markuprc.toml"),
        "[parser]\nsource-kind = \"script\"\n\n[files]\nextensions = [\"frag\"]\n",
    )
    .unwrap();
    let nested = temp_dir.path().join("views");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("a.frag"), "text <b/> <c/>").unwrap();
    fs::write(nested.join("b.xml"), "<broken").unwrap();

    cli()
        .args(["parse", nested.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files checked: 1"));
}

#[test]
fn test_explicit_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("custom.toml");
    fs::write(&config, "[parser]\nmax-depth = 2\n").unwrap();
    let file = temp_dir.path().join("deep.xml");
    fs::write(&file, "<a><b><c/></b></a>").unwrap();

    cli()
        .args(["parse", file.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("ML2010"));
}

#[test]
fn test_invalid_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("bad.toml");
    fs::write(&config, "[parser]\nunknown = 1\n").unwrap();

    cli()
        .args(["parse", temp_dir.path().to_str().unwrap(), "--config", config.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_parse_nonexistent_path() {
    cli().args(["parse", "/nonexistent/path"]).assert().failure();
}

#[test]
fn test_tree_command() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.xml");
    fs::write(&file, "<a/>").unwrap();

    cli()
        .args(["tree", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("EmptyElement@0..4"))
        .stdout(predicate::str::contains("SlashGreaterThanToken@2..4 \"/>\""));
}

#[test]
fn test_tree_with_trivia_and_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.xml");
    fs::write(&file, "<a></b></a>").unwrap();

    cli()
        .args(["tree", "--trivia", "--diagnostics", file.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("trailing SkippedTokensTrivia@3..7"))
        .stdout(predicate::str::contains("error ML2007 at 3..5"));
}

#[test]
fn test_lex_command() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.xml");
    fs::write(&file, "<a>x</a>").unwrap();

    cli()
        .args(["lex", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("LessThanToken@0..1 \"<\""))
        .stdout(predicate::str::contains("TextToken@3..4 \"x\""))
        .stdout(predicate::str::contains("EndOfFileToken@8..8"));
}

#[test]
fn test_lex_lines_command() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("a.xml");
    fs::write(&file, "<a><!-- one\ntwo --></a>\n").unwrap();

    cli()
        .args(["lex", "--lines", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("line 1"))
        .stdout(predicate::str::contains("line 2"))
        .stdout(predicate::str::contains("CommentTextToken"));
}

#[test]
fn test_check_command() {
    let temp_dir = create_test_project();
    fs::write(temp_dir.path().join("broken.xml"), "<a>\n  <b x=1>\n</a>\n").unwrap();

    cli()
        .args(["check", temp_dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 files passed"));
}
