//! Integration tests for the `mcheyne` binary.
//!
//! Each test runs the compiled binary against the shared fixture document
//! with config and client state redirected into a temporary directory.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

use mcheyne_test_utils::{NEW_YEARS_READING, write_sample_file};

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

fn mcheyne(home: &Path, data: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mcheyne"))
        .arg("--data")
        .arg(data)
        .args(args)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("MCHEYNE_STATE_PATH", home.join("state.json"))
        .env_remove("MCHEYNE_DATA_PATH")
        .env_remove("API_BASE_URL")
        .env_remove("PORT")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run mcheyne binary")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "mcheyne failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[test]
fn plans_lists_fixture_plans_with_default_selection() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();

    let out = stdout(&mcheyne(home.path(), &data, &["plans"]));
    assert!(out.contains("12_month"));
    assert!(out.contains("* 24_month"));
    assert!(out.contains("48_month"));
}

#[test]
fn date_prints_reading_and_links() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();

    let out = stdout(&mcheyne(
        home.path(),
        &data,
        &["date", "january", "1", "--plan", "12_month"],
    ));
    assert!(out.contains(NEW_YEARS_READING));
    assert!(out.contains("search=Genesis+1&version=CSB"));
}

#[test]
fn missing_date_exits_non_zero() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();

    let output = mcheyne(home.path(), &data, &["date", "2", "30", "--plan", "12_month"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2/30"));
}

#[test]
fn missing_data_file_exits_non_zero() {
    let home = TempDir::new().unwrap();
    let output = mcheyne(home.path(), &home.path().join("absent.json"), &["plans"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load reading plans"));
}

#[test]
fn done_and_progress_persist_between_runs() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();

    let out = stdout(&mcheyne(home.path(), &data, &["plan", "use", "24_month"]));
    assert_eq!(out.trim(), "Now following the 24 Month Plan.");

    stdout(&mcheyne(home.path(), &data, &["done", "1", "1"]));
    stdout(&mcheyne(home.path(), &data, &["done", "1", "2"]));

    let out = stdout(&mcheyne(home.path(), &data, &["progress"]));
    assert_eq!(out.trim(), "24 Month Plan: 2 / 6 readings complete (33.3%)");

    let out = stdout(&mcheyne(home.path(), &data, &["all"]));
    assert_eq!(out.matches("[x]").count(), 2, "only year 1 is marked:\n{out}");
}

#[test]
fn every_entry_of_a_two_year_plan_can_be_completed() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();
    stdout(&mcheyne(home.path(), &data, &["plan", "use", "24_month"]));

    for day in ["1", "2", "3"] {
        let out = stdout(&mcheyne(home.path(), &data, &["done", "1", day]));
        assert!(out.starts_with("Marked January"), "got: {out}");
        let out = stdout(&mcheyne(home.path(), &data, &["done", "1", day]));
        assert!(out.contains(", year 2 ("), "got: {out}");
    }

    let out = stdout(&mcheyne(home.path(), &data, &["progress"]));
    assert_eq!(out.trim(), "24 Month Plan: 6 / 6 readings complete (100.0%)");

    let out = stdout(&mcheyne(home.path(), &data, &["all"]));
    assert_eq!(out.matches("[x]").count(), 6, "{out}");
    assert!(out.contains("Year 2 - January"));

    let out = stdout(&mcheyne(home.path(), &data, &["done", "--entry", "4"]));
    assert_eq!(out.trim(), "Unmarked January 1, year 2 (Ezra 1, Acts 1) as complete.");
    let out = stdout(&mcheyne(home.path(), &data, &["date", "1", "1", "--year", "2"]));
    assert!(!out.lines().next().unwrap().ends_with("[done]"), "{out}");
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let (_data_dir, data) = write_sample_file();
    let home = TempDir::new().unwrap();

    stdout(&mcheyne(home.path(), &data, &["init"]));
    let written = std::fs::read_to_string(home.path().join("config/mcheyne/config.toml")).unwrap();
    assert!(written.contains("[server]"));
    assert!(written.contains("port = 3000"));

    let again = mcheyne(home.path(), &data, &["init"]);
    assert!(!again.status.success());
    stdout(&mcheyne(home.path(), &data, &["init", "--force"]));
}
