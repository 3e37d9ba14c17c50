//! `studyscout version` must emit stable machine-readable JSON on stdout.

#[test]
fn version_json_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("studyscout");
    let out = std::process::Command::new(bin)
        .args(["version"])
        .output()
        .expect("run studyscout version");

    assert!(out.status.success(), "studyscout version failed");
    let stdout = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(stdout.trim()).expect("parse version json");

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["kind"].as_str(), Some("version"));
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert_eq!(v["name"].as_str(), Some("studyscout"));
    assert!(!v["version"].as_str().unwrap_or("").is_empty());
}

#[test]
fn version_text_output_is_one_line() {
    use predicates::prelude::*;

    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("studyscout"))
        .args(["version", "--output", "text"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("studyscout "));
}
