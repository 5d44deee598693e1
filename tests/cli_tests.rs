#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::{NamedTempFile, TempDir};

#[allow(deprecated)]
fn run_cli(output_dir: &TempDir, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("PLANNER_STORAGE__OUTPUT_DIR", output_dir.path())
        .env_remove("PLANNER_REMOTE__CLIENT_ID")
        .write_stdin(script.to_string())
        .assert()
}

#[test]
fn cli_assembles_default_plan() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, "default Office Move\nsummary\nquit\n")
        .success()
        .stdout(str_contains("Schedule written to"))
        .stdout(str_contains(
            "Office Move: tasks=4, resources=4, assignments=5, total_duration=37d",
        ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn cli_save_and_load_xml_round_trip() {
    let dir = TempDir::new().unwrap();
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!("default Persisted\nsave xml {path}\nload {path}\nshow\nquit\n");

    let assert = run_cli(&dir, &script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Schedule saved to"));
    let after_reload = output
        .split("Schedule loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Deployment"), "{after_reload}");
    assert!(after_reload.contains("DevOps Engineer,Project Manager"));
}

#[test]
fn cli_plans_from_model_output_file() {
    let dir = TempDir::new().unwrap();
    let response = dir.path().join("response.txt");
    std::fs::write(
        &response,
        "Task Survey: 3 days on site\nTask Report: write it up\nResource Surveyor: field work\n",
    )
    .unwrap();

    run_cli(
        &dir,
        &format!("plan {} Site Survey\ntask 1\nquit\n", response.display()),
    )
    .success()
    .stdout(str_contains("tasks=2"))
    .stdout(str_contains("\"name\": \"Survey\""))
    .stdout(str_contains("\"duration_days\": 3"));
}

#[test]
fn cli_reports_missing_documents() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.xml");
    run_cli(
        &dir,
        &format!("load {}\nbatch {}\nshow\nquit\n", missing.display(), missing.display()),
    )
    .success()
    .stdout(str_contains("document not found"))
    .stdout(str_contains("No schedule loaded."));
}
