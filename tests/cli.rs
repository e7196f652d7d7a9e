use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

struct Env {
    dir: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("data").join("bursar.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("bursar").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("--db")
            .arg(self.db());
        cmd
    }

    fn seed(&self) {
        self.cmd()
            .args(["years", "add", "2025-2026", "--start", "2025-09-01", "--end", "2026-06-30", "--current"])
            .assert()
            .success();
        self.cmd()
            .args(["classes", "add", "FORM 2 N", "--class", "FORM 2"])
            .assert()
            .success();
        self.cmd()
            .args(["users", "add", "ADMIN001", "--name", "Bursar"])
            .assert()
            .success();
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}

fn jane_csv(env: &Env) -> PathBuf {
    env.write(
        "2N.csv",
        "SN,NAME,TOTAL EXPECTED,TOTAL PAID,STATUS\n1,Jane Doe,100000,50000,690000111\n",
    )
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_exits_zero() {
    let env = Env::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--cleanup"));
}

#[test]
fn missing_path_exits_one() {
    let env = Env::new();
    env.cmd()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: no spreadsheet given"));
}

#[test]
fn nonexistent_file_exits_one() {
    let env = Env::new();
    env.seed();
    env.cmd()
        .arg(arg(&env.dir.path().join("missing.xlsx")))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn cleanup_with_missing_file_touches_nothing() {
    let env = Env::new();
    env.cmd()
        .arg("--cleanup")
        .arg(arg(&env.dir.path().join("typo.xlsx")))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
    assert!(!env.db().exists());
    assert!(!env.dir.path().join("data").join("backups").exists());
}

#[test]
fn no_current_year_exits_one() {
    let env = Env::new();
    let csv = jane_csv(&env);
    env.cmd()
        .arg(arg(&csv))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No current academic year"));
}

#[test]
fn import_then_report_debtors() {
    let env = Env::new();
    env.seed();
    let csv = jane_csv(&env);

    env.cmd()
        .arg(arg(&csv))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 sheet(s) found"))
        .stdout(predicate::str::contains("FORM 2 N"))
        .stdout(predicate::str::contains("1 payment(s) recorded"));

    env.cmd()
        .args(["report", "debtors"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IMP0001"))
        .stdout(predicate::str::contains("Jane Doe"))
        .stdout(predicate::str::contains("50,000 FCFA"));
}

#[test]
fn clean_alias_replaces_previous_import() {
    let env = Env::new();
    env.seed();
    let csv = jane_csv(&env);
    env.cmd().arg(arg(&csv)).assert().success();

    env.cmd()
        .arg("--clean")
        .arg(arg(&csv))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Cleanup: 1 student(s), 1 enrollment(s), 1 fee record(s), 1 payment(s) removed",
        ));

    env.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Students:       1 (1 imported)"));
}

#[test]
fn cleanup_twice_second_is_noop() {
    let env = Env::new();
    env.seed();
    let csv = jane_csv(&env);
    env.cmd().arg(arg(&csv)).assert().success();

    env.cmd()
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 student(s)"));
    env.cmd()
        .arg("cleanup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to clean up"));
}

#[test]
fn missing_admin_reports_dropped_payments() {
    let env = Env::new();
    env.cmd()
        .args(["years", "add", "2025-2026", "--start", "2025-09-01", "--end", "2026-06-30", "--current"])
        .assert()
        .success();
    env.cmd().args(["classes", "seed"]).assert().success();
    let csv = jane_csv(&env);
    env.cmd()
        .arg(arg(&csv))
        .assert()
        .success()
        .stdout(predicate::str::contains("1 payment(s) not recorded"));
}

#[test]
fn sheets_json_dumps_workbook() {
    let env = Env::new();
    let csv = jane_csv(&env);
    let output = env.cmd().args(["sheets", "--json", arg(&csv)]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["2N"]["statistics"]["usedRows"], 2);
    assert_eq!(value["2N"]["formattedData"][0]["NAME"], "Jane Doe");
}
