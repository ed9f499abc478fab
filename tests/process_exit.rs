use std::{
    net::TcpListener,
    process::{Command, Output},
};

fn run_server(args: &[&str]) -> Output {
    let data = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_pomodoro-server"))
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--data-dir")
        .arg(data.path())
        .args(args)
        .env_remove("PORT")
        .env_remove("POMODORO_REMOTE_CONFIG_URL")
        .env_remove("POMODORO_DEVICE")
        .output()
        .unwrap()
}

#[test]
fn test_port_in_use_exits_non_zero() {
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port().to_string();

    let output = run_server(&["--port", &port]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to bind"));
}

#[test]
fn test_short_work_length_exits_non_zero() {
    let output = run_server(&["--work-minutes", "10", "--port", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid --work-minutes"));
}
