//! End-to-end tests running the tracker binary

use std::fs;
use std::process::Command;
use tempfile::tempdir;

const TRACKER_BIN: &str = env!("CARGO_BIN_EXE_riskzone-tracker");

#[test]
fn test_missing_input_exits_with_error() {
    let dir = tempdir().unwrap();
    let config = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml");

    let output = Command::new(TRACKER_BIN)
        .current_dir(dir.path())
        .args(["--config", config, "--input", "/nonexistent/walk.jsonl"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/nonexistent/walk.jsonl"), "stderr: {}", stderr);
    // Nothing was started, so no event file either
    assert!(!dir.path().join("events.jsonl").exists());
}

#[test]
fn test_replay_writes_alert_and_icon_events() {
    let dir = tempdir().unwrap();
    let events = dir.path().join("events.jsonl");
    let config = dir.path().join("tracker.toml");
    let input = dir.path().join("walk.jsonl");

    fs::write(
        &config,
        format!(
            r#"
[site]
id = "e2e"

[[zones]]
lat = 40.90
lon = 31.17
label = "Fazla Riskli"
color = "red"

[egress]
file = "{}"
"#,
            events.display()
        ),
    )
    .unwrap();

    fs::write(
        &input,
        concat!(
            "{\"type\":\"permission\",\"state\":\"granted\"}\n",
            "{\"type\":\"location\",\"lat\":40.90,\"lon\":31.17,\"ts\":1}\n",
            "{\"type\":\"location\",\"lat\":40.90,\"lon\":31.17,\"ts\":2}\n",
            "{\"type\":\"location\",\"lat\":40.95,\"lon\":31.17,\"ts\":3}\n",
        ),
    )
    .unwrap();

    let status = Command::new(TRACKER_BIN)
        .current_dir(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(&input)
        .status()
        .unwrap();
    assert!(status.success());

    let kinds: Vec<String> = fs::read_to_string(&events)
        .unwrap()
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(event["site"], "e2e");
            event["t"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds, ["alert", "active_zone", "active_zone"]);
}
