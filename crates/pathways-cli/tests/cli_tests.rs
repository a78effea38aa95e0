use assert_cmd::Command;
use pathways_cli::{CliArgs, MISSING_REGIONS};
use pathways_test_utils::Fixtures;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::path::Path;

fn pathways() -> Command {
    Command::cargo_bin("pathways").unwrap()
}

fn write_config(fixtures: &Fixtures, extra: &str) -> std::path::PathBuf {
    let output = fixtures.path().join("runs");
    fixtures.write(
        "pathways.toml",
        &format!("output_dir = {:?}\n{extra}", output.display().to_string()),
    )
}

fn manifest_lines(output: &Path, run_id: &str) -> Vec<serde_json::Value> {
    std::fs::read_to_string(output.join("runs").join(run_id).join("manifest.jsonl"))
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[test]
fn test_missing_regions_exits_with_usage_error() {
    pathways()
        .args(["--keys-primary", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains(MISSING_REGIONS));
}

#[test]
fn test_no_dimensions_fails_before_dispatch() {
    let fixtures = Fixtures::new();
    let config = write_config(&fixtures, "");
    pathways()
        .args(["--regions", "ALLREGIONS", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no valid dimensional subsets"));
    assert!(!fixtures.path().join("runs").exists());
}

#[test]
fn test_malformed_ids_fail() {
    pathways()
        .args(["--regions", "bra", "--keys-design", "1,x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse 'x'"));
}

#[test]
fn test_unknown_regions_only_fail_guard() {
    let fixtures = Fixtures::new();
    let config = write_config(&fixtures, "");
    pathways()
        .args(["--regions", "atlantis", "--keys-primary", "1", "--config"])
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no valid regions"));
}

#[test]
fn test_path_like_run_id_is_usage_error() {
    let fixtures = Fixtures::new();
    let config = write_config(&fixtures, "");
    let outside = fixtures.path().join("outside");
    pathways()
        .args(["--regions", "bra", "--keys-primary", "1", "--id"])
        .arg(&outside)
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid run id"));
    pathways()
        .args(["--regions", "bra", "--keys-primary", "1", "--id", "../outside", "--config"])
        .arg(&config)
        .assert()
        .code(2);
    assert!(!outside.exists());
    assert!(!fixtures.path().join("runs").exists());
}

#[test]
fn test_primary_run_writes_manifest() {
    let fixtures = Fixtures::new();
    let config = write_config(&fixtures, "");
    pathways()
        .args([
            "--regions",
            "bra,chl,xx",
            "--keys-primary",
            "4,5",
            "--id",
            "cli_run",
            "--random-seed",
            "-3",
            "--config",
        ])
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"run_id\": \"cli_run\""))
        .stderr(predicate::str::contains("run 'cli_run' complete"));

    let lines = manifest_lines(fixtures.path(), "cli_run");
    assert_eq!(lines[0]["event"], "header");
    let units: Vec<(i64, String)> = lines
        .iter()
        .filter(|l| l["event"] == "unit")
        .map(|l| (l["primary_id"].as_i64().unwrap(), l["region"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        units,
        vec![
            (4, "brazil".to_string()),
            (4, "chile".to_string()),
            (5, "brazil".to_string()),
            (5, "chile".to_string()),
        ]
    );
}

#[test]
fn test_secondary_keys_expand_through_primary_table() {
    let fixtures = Fixtures::new();
    let primary = fixtures.write_primary_table();
    let config = write_config(
        &fixtures,
        &format!("[tables]\nprimary = {:?}\n", primary.display().to_string()),
    );
    pathways()
        .args([
            "--regions",
            "mexico",
            "--keys-design",
            "0",
            "--keys-strategy",
            "1",
            "--keys-future",
            "all",
            "--id",
            "expand",
            "--config",
        ])
        .arg(&config)
        .assert()
        .success();

    let lines = manifest_lines(fixtures.path(), "expand");
    let primaries: Vec<i64> = lines
        .iter()
        .filter(|l| l["event"] == "unit")
        .map(|l| l["primary_id"].as_i64().unwrap())
        .collect();
    assert_eq!(primaries, vec![10, 11, 12]);
}

#[test]
fn test_parsed_args_resolve() {
    let args = CliArgs::try_parse_from([
        "pathways",
        "--regions",
        "ALLREGIONS",
        "--keys-primary",
        "7",
        "--keys-design",
        "1",
    ])
    .unwrap();
    let inputs = args.dimension_inputs();
    assert!(!inputs.is_empty());
}
