use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_every_subcommand() {
    Command::cargo_bin("a2actl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn run_executes_full_import_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let bookmarks = dir.path().join("bookmarks.json");
    std::fs::write(
        &bookmarks,
        r#"{"bookmarks": [{"url": "https://example.com", "title": "Example"}]}"#,
    )
    .unwrap();

    Command::cargo_bin("a2actl")
        .unwrap()
        .args(["run", "--workflow", "full_import", "--file"])
        .arg(&bookmarks)
        .assert()
        .success()
        .stdout(predicate::str::contains("Status:"));
}

#[test]
fn completion_bash_prints_a_script() {
    Command::cargo_bin("a2actl")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("a2actl"));
}
