#![cfg(all(unix, feature = "cli"))]

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/lwcli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn run_with_stdin(args: &[&str], input: &[u8]) -> (i32, Vec<u8>, Vec<u8>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_linewire"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("command should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input)
        .expect("input should be writable");

    let output = child.wait_with_output().expect("command should finish");
    (
        output.status.code().unwrap_or(-1),
        output.stdout,
        output.stderr,
    )
}

#[test]
fn double_emits_every_line_twice() {
    let (code, stdout, _stderr) = run_with_stdin(&["double"], b"alpha\nbeta\n");
    assert_eq!(code, 0);
    assert_eq!(stdout, b"alpha\nalpha\nbeta\nbeta\n");
}

#[test]
fn double_skips_oversized_lines_with_warning() {
    let (code, stdout, stderr) = run_with_stdin(
        &["--log-level", "warn", "double", "--capacity", "4"],
        b"abcdef\nok\n",
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, b"ok\nok\n");
    let stderr_text = String::from_utf8_lossy(&stderr);
    assert!(
        stderr_text.contains("longer than buffer capacity"),
        "expected overflow warning, got: {stderr_text}"
    );
}

#[test]
fn double_discards_unterminated_tail() {
    let (code, stdout, stderr) = run_with_stdin(
        &["--log-level", "warn", "double"],
        b"whole\npartial-tail",
    );
    assert_eq!(code, 0);
    assert_eq!(stdout, b"whole\nwhole\n");
    let stderr_text = String::from_utf8_lossy(&stderr);
    assert!(
        stderr_text.contains("without trailing terminator"),
        "expected trailing-residue warning, got: {stderr_text}"
    );
}

#[test]
fn convert_uppercases_the_stream() {
    let (code, stdout, _stderr) = run_with_stdin(&["convert"], b"mixed Case 42\n");
    assert_eq!(code, 0);
    assert_eq!(stdout, b"MIXED CASE 42\n");
}

#[test]
fn double_reads_from_a_fifo() {
    let dir = unique_temp_dir("double-fifo");
    let fifo_path = dir.join("input.fifo");

    let mut child = Command::new(env!("CARGO_BIN_EXE_linewire"))
        .arg("double")
        .arg("--input")
        .arg(&fifo_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("double command should start");

    // The command creates the FIFO, then blocks opening it until we attach.
    let deadline = Instant::now() + Duration::from_secs(5);
    while !fifo_path.exists() {
        assert!(Instant::now() < deadline, "fifo was never created");
        std::thread::sleep(Duration::from_millis(25));
    }

    {
        let mut producer = std::fs::OpenOptions::new()
            .write(true)
            .open(&fifo_path)
            .expect("fifo should be writable");
        producer.write_all(b"x\n").expect("fifo write should succeed");
    }

    let output = child.wait_with_output().expect("command should finish");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(output.stdout, b"x\nx\n");
    assert!(!fifo_path.exists(), "fifo should be unlinked on exit");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_prints_package_name() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_linewire"))
        .arg("version")
        .stdout(Stdio::piped())
        .spawn()
        .expect("version command should start");
    let mut stdout = String::new();
    child
        .stdout
        .take()
        .expect("stdout should be piped")
        .read_to_string(&mut stdout)
        .expect("output should be utf-8");
    let status = child.wait().expect("command should finish");

    assert!(status.success());
    assert!(stdout.starts_with("linewire "));
}

#[test]
fn send_without_payload_is_a_usage_error() {
    let output = Command::new(env!("CARGO_BIN_EXE_linewire"))
        .args(["send", "127.0.0.1", "7100"])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .expect("send command should run");

    assert_eq!(output.status.code(), Some(64));
    let stderr_text = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_text.contains("--data or --file"));
}
