use std::process::Command;

#[test]
fn cli_smoke_help() {
    let exe = env!("CARGO_BIN_EXE_tasklog");
    let output = Command::new(exe)
        .arg("--help")
        .output()
        .expect("failed to run tasklog --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("watch"));
}

#[test]
fn cli_rejects_unknown_config_override() {
    let exe = env!("CARGO_BIN_EXE_tasklog");
    let output = Command::new(exe)
        .args(["--config-override", "colour=red", "log"])
        .env("TASKLOG_DATA_DIR", std::env::temp_dir().join("tasklog-unused"))
        .output()
        .expect("failed to run tasklog");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - unknown config field 'colour'"));
}
