//! CLI surface smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_both_operations() {
    Command::cargo_bin("oddsgate")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("bet"));
}

#[test]
fn snapshot_requires_provider_and_kind() {
    Command::cargo_bin("oddsgate")
        .unwrap()
        .arg("snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--provider"));
}

#[test]
fn bet_rejects_unknown_bet_type() {
    Command::cargo_bin("oddsgate")
        .unwrap()
        .args([
            "bet",
            "--provider",
            "bookline",
            "--kind",
            "mens",
            "--match-id",
            "A|B",
            "--participant",
            "A",
            "--stake",
            "10",
            "--bet-type",
            "parlay",
        ])
        .assert()
        .failure();
}
