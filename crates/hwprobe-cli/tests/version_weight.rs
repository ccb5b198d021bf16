//! Integration tests for the small informational subcommands.

use std::process::Command;

fn hwprobe() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hwprobe"))
}

#[test]
fn test_version_output() {
    let output = hwprobe().arg("version").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("hwprobe "), "stdout: {stdout}");
}

#[test]
fn test_weight_of_single_letter() {
    let output = hwprobe().args(["weight", "A"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "2");
}

#[test]
fn test_weight_json() {
    let output = hwprobe().args(["--json", "weight", "Az0"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["weight"].as_u64(), Some(9));
    assert_eq!(json["chars"].as_u64(), Some(3));
}

#[test]
fn test_run_rejects_zero_trials() {
    let output = hwprobe()
        .args(["run", "--trials", "0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
