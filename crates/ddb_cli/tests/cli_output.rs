use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

fn fixture_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../ddb_core/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .to_string()
}

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ddb2cc"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run ddb2cc CLI")
}

fn temp_output_path(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("{prefix}_{}_{}.json", std::process::id(), nanos))
}

#[test]
fn cli_prints_output_document_by_default() {
    let output = run_cli(&[&fixture_path("battle_master.json")]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(value["kind"], "character");
    assert_eq!(value["data"]["name"], "Brannoc Vell");
    assert_eq!(value["data"]["status"][0]["max"], 59);
}

#[test]
fn cli_prints_korean_attack_panel() {
    let output = run_cli(&["--attacks", "--locale", "ko", &fixture_path("battle_master.json")]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        "[무기 공격]\n1d20+6 Longsword\n1d8+3 Longsword 참격 대미지\n1d20+6 Javelin\n1d6+3 Javelin 관통 대미지\n1d20+6 Unarmed Strike\n1+3 Unarmed Strike 타격 대미지"
    );
}

#[test]
fn cli_prints_selected_sections_in_fixed_order() {
    let output = run_cli(&["--inventory", "--features", &fixture_path("battle_master.json")]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let features = stdout.find("[Background]").expect("features panel");
    let inventory = stdout.find("[Currency]").expect("inventory panel");
    assert!(features < inventory);
    assert!(!stdout.contains("[Weapon Attacks]"));
}

#[test]
fn cli_json_mode_limits_keys_to_selection() {
    let output = run_cli(&["--json", "--spells", &fixture_path("life_cleric.json")]);
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let keys: Vec<&str> = value
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, ["spells"]);
    assert_eq!(value["spells"]["spellcasting"][0]["saveDc"], 14);
}

#[test]
fn cli_reads_stdin() {
    let bytes = std::fs::read(fixture_path("life_cleric.json")).expect("fixture");
    let mut child = Command::new(env!("CARGO_BIN_EXE_ddb2cc"))
        .args(["--statblock", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn ddb2cc CLI");
    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&bytes)
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait for CLI");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Sister Maren\nCleric 5 | Level 5"));
}

#[test]
fn cli_writes_output_document_to_file() {
    let out_path = temp_output_path("ddb2cc_output");
    let out = out_path.to_string_lossy().to_string();
    let output = run_cli(&[
        "--output",
        &out,
        "--memo",
        "Session 12",
        &fixture_path("life_cleric.json"),
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Wrote output document to"));

    let written = std::fs::read(&out_path).expect("output file should exist");
    let value: Value = serde_json::from_slice(&written).expect("output file should be JSON");
    assert!(
        value["data"]["memo"]
            .as_str()
            .expect("memo")
            .contains("Session 12")
    );
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn cli_reports_missing_file() {
    let output = run_cli(&["/definitely/not/here.json"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: reading /definitely/not/here.json"));
}

#[test]
fn cli_reports_document_without_name() {
    let path = temp_output_path("ddb2cc_nameless");
    std::fs::write(&path, br#"{ "stats": [] }"#).expect("write temp file");
    let output = run_cli(&[&path.to_string_lossy()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MissingName"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn cli_rejects_unknown_locale_as_usage_error() {
    let output = run_cli(&["--locale", "fr", &fixture_path("life_cleric.json")]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_rejects_fetch_from_stdin() {
    let output = run_cli(&["--fetch", "-"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cli_fetch_requires_an_identifier() {
    let output = run_cli(&["--fetch", "https://www.dndbeyond.com/campaigns/99"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("numeric character id"));
}
