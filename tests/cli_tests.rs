//! CLI behavior tests: one bundle per invocation, fatal errors abort cleanly
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

mod utils;

use predicates::prelude::*;

fn seeded_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    utils::seed_employees(dir.path(), 2025, "july", 5);
    utils::seed_employees(dir.path(), 2025, "august", 6);
    utils::seed_attendance(
        dir.path(),
        2025,
        "august",
        &[
            ("E0000", "2025-08-01", "present"),
            ("E0001", "2025-08-01", "unauthorized"),
        ],
    );
    dir
}

#[test]
fn test_json_bundle_written_to_stdout() {
    let dir = seeded_dir();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"kintai-bundle-v1\""))
        .stdout(predicate::str::contains("\"2025-07\""))
        .stdout(predicate::str::contains("\"2025-08\""));
}

#[test]
fn test_bundle_written_to_file() {
    let dir = seeded_dir();
    let out = dir.path().join("bundle.json");
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    let written = std::fs::read_to_string(&out).unwrap();
    assert!(written.contains("kintai-bundle-v1"));
}

#[test]
fn test_text_format_prints_metric_table() {
    let dir = seeded_dir();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .arg("--format")
        .arg("text")
        .assert()
        .success()
        .stdout(predicate::str::contains("total_employees"))
        .stdout(predicate::str::contains("unauthorized_absence_rate"));
}

#[test]
fn test_summary_reports_findings_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("employees_2025_july.csv"),
        "id,name,position,team,join_date,resignation_date\n\
         E001,Alice,staff,Engineering,2025-06-01,2025-01-01\n",
    )
    .unwrap();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-07")
        .arg("--summary")
        .assert()
        .success()
        .stderr(predicate::str::contains("Data Quality Report"))
        .stderr(predicate::str::contains("temporal-inconsistency"));
}

#[test]
fn test_views_flag_includes_materialized_catalog() {
    let dir = seeded_dir();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .arg("--views")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"views\""))
        .stdout(predicate::str::contains("\"attrition_risk\""));
}

#[test]
fn test_missing_data_dir_fails_with_actionable_message() {
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg("/nonexistent/source")
        .arg("-m")
        .arg("2025-08")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read source directory"));
}

#[test]
fn test_misconfigured_catalog_fails_before_rendering() {
    let dir = seeded_dir();
    let catalog = dir.path().join("catalog.toml");
    std::fs::write(
        &catalog,
        "[[kpi]]\nkey = \"broken\"\ntitle = \"Broken\"\n\n\
         [[kpi.section]]\ntype = \"pie_chart\"\ntitle = \"Nope\"\n",
    )
    .unwrap();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .arg("--catalog")
        .arg(&catalog)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown section type"))
        .stderr(predicate::str::contains("broken"));
}

#[test]
fn test_invalid_month_argument_rejected() {
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(".")
        .arg("-m")
        .arg("August 2025")
        .assert()
        .failure();
}

#[test]
fn test_empty_directory_still_emits_one_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::Command::cargo_bin("kintai").unwrap();
    cmd.arg("-d")
        .arg(dir.path())
        .arg("-m")
        .arg("2025-08")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"months\": []"));
}
