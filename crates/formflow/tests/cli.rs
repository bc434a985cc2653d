mod common;

use assert_cmd::Command;
use common::{VISA_ANSWERS_PATH, VISA_FORM_PATH};
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("formflow").expect("binary builds");
    let keys = [
        "FORMFLOW_CONFIG",
        "FORMFLOW_STORE_DIR",
        "FORMFLOW_LOG",
        "FORMFLOW_POINTER",
        "RUST_LOG",
    ];
    for key in keys {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn new_id_prints_requested_count() {
    let output = cmd()
        .args(["new-id", "--count", "3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8 output");
    let ids: Vec<_> = text.lines().collect();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.len() == 9));
}

#[test]
fn schema_prints_json_schema() {
    cmd()
        .arg("schema")
        .assert()
        .success()
        .stdout(contains("FormSchema").and(contains("sections")));
}

#[test]
fn validate_accepts_complete_answers() {
    cmd()
        .args(["validate", "--schema", VISA_FORM_PATH])
        .args(["--answers", VISA_ANSWERS_PATH])
        .args(["--today", "2026-01-15"])
        .assert()
        .success()
        .stdout(contains("\"valid\": true"));
}

#[test]
fn validate_reports_missing_answers() {
    let temp = TempDir::new().expect("tempdir");
    let answers = temp.path().join("answers.json");
    std::fs::write(&answers, r#"{"personal": {"surname": "Doe"}}"#).expect("write answers");

    cmd()
        .args(["validate", "--schema", VISA_FORM_PATH, "--step", "0"])
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stdout(contains("personal.given_name"))
        .stderr(contains("missing required"));
}

#[test]
fn validate_rejects_bad_reference_date() {
    cmd()
        .args(["validate", "--schema", VISA_FORM_PATH])
        .args(["--answers", VISA_ANSWERS_PATH])
        .args(["--today", "15/01/2026"])
        .assert()
        .failure()
        .stderr(contains("expected YYYY-MM-DD"));
}

#[test]
fn resolve_hides_closed_blocks() {
    cmd()
        .args(["resolve", "--schema", VISA_FORM_PATH])
        .args(["--answers", VISA_ANSWERS_PATH])
        .args(["--step", "2"])
        .assert()
        .success()
        .stdout(contains("travel.arrival_date").and(contains("travel.specific_purpose").not()));
}

#[test]
fn resume_from_answers_file_reports_review_step() {
    cmd()
        .args(["resume", "--schema", VISA_FORM_PATH])
        .args(["--answers", VISA_ANSWERS_PATH])
        .assert()
        .success()
        .stdout(contains("\"step\": 5").and(contains("\"section\": \"review\"")));
}

#[test]
fn new_then_resume_through_file_store() {
    let temp = TempDir::new().expect("tempdir");
    let store_dir = temp.path().join("apps");
    let pointer = temp.path().join("current_form");

    let output = cmd()
        .env("FORMFLOW_STORE_DIR", &store_dir)
        .env("FORMFLOW_POINTER", &pointer)
        .args(["new", "--schema", VISA_FORM_PATH])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8 output");
    let id = text.trim().to_string();
    assert!(store_dir.join(format!("{id}.json")).exists());
    let current = std::fs::read_to_string(&pointer).expect("pointer written");
    assert_eq!(current, id);

    cmd()
        .env("FORMFLOW_STORE_DIR", &store_dir)
        .env("FORMFLOW_POINTER", &pointer)
        .args(["resume", "--schema", VISA_FORM_PATH])
        .assert()
        .success()
        .stdout(contains(id.as_str()).and(contains("\"status\": \"draft\"")));

    cmd()
        .env("FORMFLOW_STORE_DIR", &store_dir)
        .args(["review", "--schema", VISA_FORM_PATH, "--id", &id])
        .assert()
        .success()
        .stdout(contains("not_provided"));
}

#[test]
fn new_with_memory_store_leaves_pointer_alone() {
    let temp = TempDir::new().expect("tempdir");
    let pointer = temp.path().join("current");

    cmd()
        .env("FORMFLOW_POINTER", &pointer)
        .args(["new", "--schema", VISA_FORM_PATH])
        .assert()
        .success()
        .stdout(predicate::str::is_match("^[A-Z]{2}[0-9]{2}[A-Z]{3}[0-9]{2}\n$").expect("regex"))
        .stderr(contains("not persistent"));
    assert!(!pointer.exists());
}

#[test]
fn review_of_unknown_id_fails() {
    let temp = TempDir::new().expect("tempdir");
    cmd()
        .env("FORMFLOW_STORE_DIR", temp.path())
        .args(["review", "--schema", VISA_FORM_PATH, "--id", "AB12CDE34"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}
