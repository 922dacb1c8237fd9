//! CLI and shutdown integration tests for the `spout` binary.

use std::process::Command;
use std::time::Duration;

/// CLI --help output should show the pump options.
#[test]
fn test_cli_help_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_spout"))
        .arg("--help")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);

    for flag in [
        "--poll-interval-ms",
        "--min-batch-size",
        "--error-policy",
        "--source",
        "--log-level",
    ] {
        assert!(stdout.contains(flag), "help should mention {flag}");
    }
    assert!(stdout.contains("heartbeat"), "help should list source kinds");
}

/// CLI --version should show version.
#[test]
fn test_cli_version_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_spout"))
        .arg("--version")
        .output()
        .expect("failed to run");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(env!("CARGO_PKG_VERSION")),
        "version output should contain version number: {}",
        stdout
    );
}

/// Invalid settings are rejected with a non-zero exit.
#[test]
fn test_cli_rejects_zero_min_batch_size() {
    let output = Command::new(env!("CARGO_BIN_EXE_spout"))
        .args(["--min-batch-size", "0"])
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run");

    assert!(!output.status.success());
}

/// Graceful shutdown: the pump prints heartbeats and exits cleanly on SIGTERM.
#[cfg(unix)]
#[tokio::test]
async fn test_graceful_shutdown_on_sigterm() {
    use std::process::Stdio;
    use tokio::process::Command as TokioCommand;
    use tokio::time::timeout;

    let child = TokioCommand::new(env!("CARGO_BIN_EXE_spout"))
        .args(["--poll-interval-ms", "100", "--source", "heartbeat"])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn spout");

    // Let a few ticks happen
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Send SIGTERM using kill command
    let pid = child.id().expect("no pid");
    let _ = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status();

    let output = timeout(Duration::from_secs(5), child.wait_with_output())
        .await
        .expect("spout did not respond to SIGTERM within timeout")
        .expect("failed to wait for child");

    assert!(output.status.success(), "spout should exit cleanly");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("heartbeat #1"),
        "stdout should carry delivered heartbeats: {}",
        stdout
    );
}

/// The stdin source delivers piped lines and still exits on SIGTERM while
/// standard input stays open.
#[cfg(unix)]
#[tokio::test]
async fn test_stdin_source_exits_on_sigterm_with_open_input() {
    use std::process::Stdio;
    use tokio::io::AsyncWriteExt;
    use tokio::process::Command as TokioCommand;
    use tokio::time::timeout;

    let mut child = TokioCommand::new(env!("CARGO_BIN_EXE_spout"))
        .args(["--poll-interval-ms", "100", "--source", "stdin"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn spout");

    // Held until the end of the test so the reader never sees EOF
    let mut stdin = child.stdin.take().expect("no stdin handle");
    stdin
        .write_all(b"build finished\n")
        .await
        .expect("failed to write to stdin");
    stdin.flush().await.expect("failed to flush stdin");

    tokio::time::sleep(Duration::from_secs(1)).await;

    let pid = child.id().expect("no pid");
    let _ = Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .status();

    let output = timeout(Duration::from_secs(5), child.wait_with_output())
        .await
        .expect("spout did not exit on SIGTERM while stdin was open")
        .expect("failed to wait for child");

    assert!(output.status.success(), "spout should exit cleanly");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains(r#""text":"build finished""#),
        "piped line should be delivered as JSON: {}",
        stdout
    );

    drop(stdin);
}
