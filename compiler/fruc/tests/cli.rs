// Test code uses unwrap/expect for clarity - panics provide good test failure messages
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Exit codes and streams of the `fruc` binary.

use std::process::Command;

fn fruc() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fruc"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn no_arguments_prints_usage() {
    let out = fruc().output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage: fruc"));
}

#[test]
fn unknown_command_fails() {
    let out = fruc().arg("frobnicate").output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unknown command: frobnicate"));
}

#[test]
fn check_exit_code_follows_problems() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.fru");
    let bad = dir.path().join("bad.fru");
    std::fs::write(&good, "let a = 1;\n").unwrap();
    std::fs::write(&bad, "let a = 1\nlet = 2;\n").unwrap();

    let out = fruc().arg("check").arg(&good).output().unwrap();
    assert!(out.status.success());

    let out = fruc().arg("check").arg(&good).arg(&bad).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("bad.fru"));
}

#[test]
fn parse_prints_trees() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.fru");
    std::fs::write(&file, "print(1);").unwrap();

    let out = fruc().arg("parse").arg(&file).output().unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("(source_file (expression_statement (call_expression"),
        "{stdout}"
    );
}

#[test]
fn unreadable_file_is_a_command_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = fruc()
        .arg("parse")
        .arg(dir.path().join("missing.fru"))
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("error: cannot read"), "{stderr}");
}

#[test]
fn bad_edit_offsets_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.fru");
    std::fs::write(&file, "let a = 1;").unwrap();

    let out = fruc()
        .arg("edit")
        .arg(&file)
        .args(["4", "99", "x"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("invalid edit"));
}
