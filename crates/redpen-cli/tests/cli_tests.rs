//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use redpen_core::store::{FsSnapshotStore, SnapshotKey};
use tempfile::TempDir;

/// A `redpen` invocation isolated in `dir`: no user config, no remote.
fn redpen(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("redpen").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("REDPEN_API_KEY")
        .env_remove("REDPEN_BASE_URL")
        .env_remove("REDPEN_MODEL");
    cmd
}

fn find_output(dir: &Path, prefix: &str, ext: &str) -> PathBuf {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .find(|path| {
            let name = path.file_name().unwrap().to_string_lossy();
            name.starts_with(prefix) && name.ends_with(ext)
        })
        .unwrap_or_else(|| panic!("no {prefix}*{ext} in {}", dir.display()))
}

/// Generate an assessment into `dir/out`; returns (assessment, answers).
fn generate(dir: &Path) -> (PathBuf, PathBuf) {
    redpen(dir)
        .args(["generate", "--subject", "Computer Science", "--output", "out"])
        .assert()
        .success();
    let out = dir.join("out");
    (
        find_output(&out, "assessment-", ".json"),
        find_output(&out, "answers-", ".json"),
    )
}

fn evaluate(dir: &Path, assessment: &Path, answers: &Path) -> PathBuf {
    redpen(dir)
        .arg("evaluate")
        .arg("--assessment")
        .arg(assessment)
        .arg("--answers")
        .arg(answers)
        .args(["--output", "out"])
        .assert()
        .success();
    find_output(&dir.join("out"), "report-", ".json")
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    redpen(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created redpen.toml"));
    assert!(dir.path().join("redpen.toml").exists());

    redpen(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn generate_writes_assessment_and_answers() {
    let dir = TempDir::new().unwrap();

    redpen(dir.path())
        .args(["generate", "--subject", "System Design", "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("8 questions"))
        .stdout(predicate::str::contains("deterministic source"))
        .stdout(predicate::str::contains("Answers template"));

    let out = dir.path().join("out");
    let answers = std::fs::read_to_string(find_output(&out, "answers-", ".json")).unwrap();
    let answers: serde_json::Value = serde_json::from_str(&answers).unwrap();
    assert_eq!(answers.as_array().unwrap().len(), 8);
    assert_eq!(answers[0]["questionId"], "q-1");

    // Best-effort snapshot lands in the default store directory.
    assert!(dir.path().join("redpen-store").join("assessment").exists());
}

#[test]
fn evaluate_blank_answers_writes_every_format() {
    let dir = TempDir::new().unwrap();
    let (assessment, answers) = generate(dir.path());

    redpen(dir.path())
        .arg("evaluate")
        .arg("--assessment")
        .arg(&assessment)
        .arg("--answers")
        .arg(&answers)
        .args(["--output", "out", "--format", "all", "--candidate", "cand-42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: "))
        .stdout(predicate::str::contains("Percentile: P"))
        .stdout(predicate::str::contains("HTML report"))
        .stdout(predicate::str::contains("Markdown report"));

    let out = dir.path().join("out");
    let report = std::fs::read_to_string(find_output(&out, "report-", ".json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["candidateId"], "cand-42");
    assert_eq!(report["evaluations"].as_array().unwrap().len(), 10);
    find_output(&out, "report-", ".html");
    find_output(&out, "report-", ".md");
}

#[test]
fn evaluate_rejects_unknown_format() {
    let dir = TempDir::new().unwrap();
    let (assessment, answers) = generate(dir.path());

    redpen(dir.path())
        .arg("evaluate")
        .arg("--assessment")
        .arg(&assessment)
        .arg("--answers")
        .arg(&answers)
        .args(["--format", "sarif"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown format"));
}

#[test]
fn override_updates_report_and_calibration() {
    let dir = TempDir::new().unwrap();
    let (assessment, answers) = generate(dir.path());
    let report = evaluate(dir.path(), &assessment, &answers);

    redpen(dir.path())
        .arg("override")
        .arg("--report")
        .arg(&report)
        .arg("--assessment")
        .arg(&assessment)
        .args(["--question", "q-1", "--score", "10", "--note", "Strong verbal answer"])
        .assert()
        .success()
        .stdout(predicate::str::contains("q-1: 0 -> 10"))
        .stdout(predicate::str::contains("after 1 override(s)"));

    let updated: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(updated["evaluations"][0]["score"], 10);
    assert_eq!(updated["reviewerOverrides"][0]["note"], "Strong verbal answer");

    let store = FsSnapshotStore::new(dir.path().join("redpen-store"));
    assert!(store
        .path_for(&SnapshotKey::Calibration("Computer Science".into()))
        .exists());

    redpen(dir.path())
        .args(["calibration", "--subject", "Computer Science"])
        .assert()
        .success()
        .stdout(predicate::str::contains("factor 1.05 after 1 override(s)"));
}

#[test]
fn override_rejects_out_of_range_score() {
    let dir = TempDir::new().unwrap();
    let (assessment, answers) = generate(dir.path());
    let report = evaluate(dir.path(), &assessment, &answers);

    redpen(dir.path())
        .arg("override")
        .arg("--report")
        .arg(&report)
        .arg("--assessment")
        .arg(&assessment)
        .args(["--question", "q-1", "--score", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 10"));
}

#[test]
fn calibration_without_history_is_neutral() {
    let dir = TempDir::new().unwrap();
    redpen(dir.path())
        .args(["calibration", "--subject", "Machine Learning"])
        .assert()
        .success()
        .stdout(predicate::str::contains("factor 1.00 after 0 override(s)"))
        .stdout(predicate::str::contains("nothing stored"));
}

#[test]
fn regenerate_refines_one_question() {
    let dir = TempDir::new().unwrap();
    let (assessment, _) = generate(dir.path());
    let refined = dir.path().join("refined.json");

    redpen(dir.path())
        .arg("regenerate")
        .arg("--assessment")
        .arg(&assessment)
        .args(["--question", "q-2", "--output"])
        .arg(&refined)
        .assert()
        .success()
        .stdout(predicate::str::contains("Refined variant"));

    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&refined).unwrap()).unwrap();
    let prompt = value["questions"][1]["prompt"].as_str().unwrap();
    assert!(prompt.contains("Refined variant"));
    let untouched = value["questions"][0]["prompt"].as_str().unwrap();
    assert!(!untouched.contains("Refined variant"));
}

#[test]
fn regenerate_unknown_question_fails() {
    let dir = TempDir::new().unwrap();
    let (assessment, _) = generate(dir.path());

    redpen(dir.path())
        .arg("regenerate")
        .arg("--assessment")
        .arg(&assessment)
        .args(["--question", "q-99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no question 'q-99'"));
}

#[test]
fn validate_generated_documents() {
    let dir = TempDir::new().unwrap();
    let (assessment, answers) = generate(dir.path());
    let report = evaluate(dir.path(), &assessment, &answers);

    redpen(dir.path())
        .arg("validate")
        .arg("--assessment")
        .arg(&assessment)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("10 questions"))
        .stdout(predicate::str::contains("All documents valid"));
}

#[test]
fn validate_flags_broken_assessment() {
    let dir = TempDir::new().unwrap();
    let (assessment, _) = generate(dir.path());

    let mut value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&assessment).unwrap()).unwrap();
    value["questions"][0]["correctOptionId"] = serde_json::Value::String("z".into());
    std::fs::write(&assessment, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    redpen(dir.path())
        .arg("validate")
        .arg("--assessment")
        .arg(&assessment)
        .assert()
        .failure()
        .stdout(predicate::str::contains("[q-1] ERROR"))
        .stderr(predicate::str::contains("validation error(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    let dir = TempDir::new().unwrap();
    redpen(dir.path())
        .args(["validate", "--assessment", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}
