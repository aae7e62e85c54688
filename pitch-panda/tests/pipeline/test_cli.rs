//! The compiled binary's exit behaviour

use std::process::Command;

#[test]
fn test_fatal_error_goes_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");

    let output = Command::new(env!("CARGO_BIN_EXE_pitch-panda"))
        .arg("--config")
        .arg(&missing)
        .arg("--database")
        .arg(dir.path().join("analyses.db"))
        .arg("list")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: Failed to read config file"));
}
