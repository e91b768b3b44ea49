//! Integration tests for the report, diagnose, forecast, action and
//! dashboard commands over the sample data.
//!
//! The sample week ends 4, 2, 2 hours on 8-10 March: a stable trend, so the
//! top-rated filter applies and Alpha (most popular) is the first pick.

mod common;

use common::{TestEnv, json_stdout};
use predicates::prelude::*;

#[test]
fn test_views_without_gold_tables_degrade() {
    let env = TestEnv::init();

    let report = json_stdout(&env.lens().arg("report").output().unwrap());
    assert_eq!(report["status"], "insufficient_data");

    let diagnosis = json_stdout(&env.lens().arg("diagnose").output().unwrap());
    assert_eq!(diagnosis["rhythm"]["status"], "insufficient_data");
    assert_eq!(diagnosis["viewer"]["status"], "insufficient_data");

    env.lens()
        .args(["-H", "action"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Insufficient data"));
}

#[test]
fn test_report_totals() {
    let env = TestEnv::init();
    env.seed();

    let report = json_stdout(&env.lens().arg("report").output().unwrap());
    assert_eq!(report["status"], "ready");
    assert_eq!(report["total_hours"], 17.5);
    assert_eq!(report["total_activities"], 9);
    assert_eq!(report["days"], 7);
    assert_eq!(report["timeline"][0]["date"], "2025-03-04");

    env.lens()
        .args(["-H", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Historical Report"))
        .stdout(predicate::str::contains("Calendar Activity"));
}

#[test]
fn test_diagnose_profiles() {
    let env = TestEnv::init();
    env.seed();

    let diagnosis = json_stdout(&env.lens().arg("diagnose").output().unwrap());
    // Saturday 8 March sums to 4h over two categories, averaging 2h per row
    // like every other spread day, so the tie goes to Monday.
    assert_eq!(diagnosis["rhythm"]["best_day"], "Monday");
    assert_eq!(diagnosis["rhythm"]["rhythm"], "monday_starter");
    assert_eq!(diagnosis["rhythm"]["weekdays"][5]["average_hours"], 2.0);
    assert_eq!(diagnosis["focus"]["top_category"], "Academic");
    assert_eq!(diagnosis["focus"]["balanced"], false);
    assert_eq!(diagnosis["viewer"]["total_watched"], 1);
}

#[test]
fn test_forecast_stable() {
    let env = TestEnv::init();
    env.seed();

    let forecast = json_stdout(&env.lens().arg("forecast").output().unwrap());
    assert_eq!(forecast["status"], "ready");
    assert_eq!(forecast["state"], "STABLE");
    assert_eq!(forecast["as_of"], "2025-03-10");
    assert_eq!(forecast["days_considered"], 3);

    env.lens()
        .args(["-H", "forecast"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trend: STABLE"));
}

#[test]
fn test_action_recommends_and_skips_rejected() {
    let env = TestEnv::init();
    env.seed();

    let plan = json_stdout(&env.lens().arg("action").output().unwrap());
    assert_eq!(plan["strategy"]["mode"], "Maintenance Mode");
    assert_eq!(plan["permission"]["verdict"], "allowed");
    assert_eq!(plan["recommendation"]["kind"], "pick");
    assert_eq!(plan["recommendation"]["movie"]["title"], "Alpha");

    let plan = json_stdout(
        &env.lens()
            .args(["action", "--reject", "Alpha"])
            .output()
            .unwrap(),
    );
    assert_eq!(plan["recommendation"]["movie"]["title"], "Beta");
    assert_eq!(
        plan["recommendation"]["movie"]["overview"],
        "Summary not available."
    );

    let plan = json_stdout(
        &env.lens()
            .args(["action", "--reject", "Alpha", "--reject", "Beta"])
            .output()
            .unwrap(),
    );
    assert_eq!(plan["recommendation"]["kind"], "exhausted");
}

#[test]
fn test_override_outside_sharp_drop_fails() {
    let env = TestEnv::init();
    env.seed();

    env.lens()
        .args(["action", "--override"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("override is only available"));
}

#[test]
fn test_dashboard_session_over_stdin() {
    let env = TestEnv::init();
    env.seed();

    let output = env
        .lens()
        .arg("dashboard")
        .write_stdin("forecast\nreject\naccept\nfly\nquit\nreport\n")
        .output()
        .unwrap();
    assert!(output.status.success());

    let lines: Vec<serde_json::Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0]["state"], "STABLE");
    assert_eq!(lines[1]["event"], "rejected");
    assert_eq!(lines[1]["title"], "Alpha");
    assert_eq!(lines[2]["event"], "accepted");
    assert_eq!(lines[2]["title"], "Beta");
    assert_eq!(lines[2]["action"]["recommendation"]["accepted"], true);
    assert!(lines[3]["error"].as_str().unwrap().contains("unknown command"));
}

#[test]
fn test_dashboard_human_prompt() {
    let env = TestEnv::init();
    env.seed();

    env.lens()
        .args(["-H", "dashboard"])
        .write_stdin("help\naction\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("lens> "))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("> Alpha"));
}
