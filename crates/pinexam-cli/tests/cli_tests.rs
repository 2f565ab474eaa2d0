//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn pinexam() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("pinexam").unwrap()
}

/// A temp dir initialised with the demo course and a file-backed config.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    pinexam()
        .current_dir(dir.path())
        .env_remove("PINEXAM_DATA_DIR")
        .env_remove("PINEXAM_COURSES_DIR")
        .arg("init")
        .assert()
        .success();
    dir
}

fn run(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    pinexam()
        .current_dir(dir)
        .env_remove("PINEXAM_DATA_DIR")
        .env_remove("PINEXAM_COURSES_DIR")
        .args(args)
        .assert()
}

fn stdout_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn start_demo(dir: &Path) -> String {
    let assert = run(dir, &["start", "--course", "demo", "--seed", "7"]).success();
    let out = stdout_of(&assert);
    out.lines()
        .find_map(|l| l.strip_prefix("Started journal for pin "))
        .map(|p| p.trim().to_string())
        .expect("pin in output")
}

fn test_ids(dir: &Path, pin: &str) -> Vec<String> {
    let assert = run(dir, &["show", "--pin", pin]).success();
    let journal: Value = serde_json::from_str(&stdout_of(&assert)).unwrap();
    journal["structure"]["sets"][0]["elements"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["kind"] == "test")
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

fn answer_all(dir: &Path, pin: &str) {
    for id in test_ids(dir, pin) {
        let value = match id.as_str() {
            "colors" => "[true,false,true]",
            "capital" => "[true,false]",
            "kingdoms" => r#"["animal","plant"]"#,
            "colon" => "[[5,6]]",
            _ => continue,
        };
        run(
            dir,
            &["answer", "--pin", pin, "--set", "basics", "--test", &id, "--value", value],
        )
        .success()
        .stdout(predicate::str::contains("Recorded answer"));
    }
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    pinexam()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created pinexam.toml"))
        .stdout(predicate::str::contains("Created courses/demo/en.json"));

    assert!(dir.path().join("pinexam.toml").exists());
    assert!(dir.path().join("courses/demo/en.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = workspace();

    run(dir.path(), &["init"])
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn validate_demo_course() {
    let dir = workspace();

    run(dir.path(), &["validate", "--course", "courses"])
        .success()
        .stdout(predicate::str::contains("Demo course"))
        .stdout(predicate::str::contains("All course documents valid"));
}

#[test]
fn validate_reports_structural_and_semantic_problems() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("courses/demo/de.json"),
        r#"{"title": 5, "validationSchemaTemplate": "A", "tests": [], "sets": [], "extra": 1}"#,
    )
    .unwrap();
    std::fs::write(
        dir.path().join("courses/demo/fr.json"),
        r#"{"title": "x", "validationSchemaTemplate": "A", "tests": [], "sets": [{"id": "s", "elements": ["ghost"]}]}"#,
    )
    .unwrap();

    run(dir.path(), &["validate", "--course", "courses"])
        .failure()
        .stdout(predicate::str::contains("/title"))
        .stdout(predicate::str::contains("extra"))
        .stdout(predicate::str::contains("ghost"))
        .stderr(predicate::str::contains("2 of 3 course document(s) invalid"));
}

#[test]
fn validate_nonexistent_file() {
    pinexam()
        .arg("validate")
        .arg("--course")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn courses_lists_demo() {
    let dir = workspace();

    run(dir.path(), &["courses"])
        .success()
        .stdout(predicate::str::contains("demo/en"));
}

#[test]
fn start_unknown_course_fails() {
    let dir = workspace();

    run(dir.path(), &["start", "--course", "nope"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn show_unknown_pin_fails() {
    let dir = workspace();

    run(dir.path(), &["show", "--pin", "12345678"])
        .failure()
        .stderr(predicate::str::contains("no journal for pin 12345678"));
}

#[test]
fn answer_rejects_invalid_json() {
    let dir = workspace();
    let pin = start_demo(dir.path());

    run(
        dir.path(),
        &["answer", "--pin", &pin, "--set", "basics", "--test", "colon", "--value", "[[5,"],
    )
    .failure()
    .stderr(predicate::str::contains("not valid JSON"));
}

#[test]
fn full_workflow_locks_results() {
    let dir = workspace();
    let pin = start_demo(dir.path());

    let ids = test_ids(dir.path(), &pin);
    assert_eq!(ids.len(), 4, "one warm-up test plus three fixed tests: {ids:?}");

    answer_all(dir.path(), &pin);

    let total = if ids.iter().any(|id| id == "colors") {
        "Total: 5/5"
    } else {
        "Total: 4/4"
    };
    run(dir.path(), &["update", "--pin", &pin])
        .success()
        .stdout(predicate::str::contains("kingdoms"))
        .stdout(predicate::str::contains(total));

    let first = stdout_of(&run(dir.path(), &["lock", "--pin", &pin, "--seed", "1"]).success());
    let second = stdout_of(&run(dir.path(), &["lock", "--pin", &pin, "--seed", "2"]).success());
    assert!(first.starts_with("Validation code: "));
    assert_eq!(first, second);

    run(dir.path(), &["update", "--pin", &pin])
        .failure()
        .stderr(predicate::str::contains("locked"));

    let out = dir.path().join("out");
    run(
        dir.path(),
        &["report", "--pin", &pin, "--format", "all", "--output", out.to_str().unwrap()],
    )
    .success();

    let files: Vec<_> = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 3);
    let json = files
        .iter()
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .unwrap();
    let sheet: Value = serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    let code = first.trim().strip_prefix("Validation code: ").unwrap();
    assert_eq!(sheet["validation_code"], code);
    assert_eq!(sheet["summaries"][0]["thresholdText"], "Well done!");
}

#[test]
fn help_output() {
    pinexam()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pin-based assessment engine"));
}
