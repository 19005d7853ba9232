use std::io::Write;
use std::process::{Command, Stdio};

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_b64enc"))
}

fn run_stdin(args: &[&str], input: &[u8]) -> std::process::Output {
    let mut child = bin()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    // The child may exit before reading (usage errors), closing the pipe early.
    let _ = child.stdin.take().unwrap().write_all(input);
    child.wait_with_output().unwrap()
}

#[test]
fn test_stdin_foobar() {
    let output = run_stdin(&[], b"foobar");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"Zm9vYmFy");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_stdin_empty() {
    let output = run_stdin(&[], b"");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_stdin_dash_with_padding() {
    let output = run_stdin(&["-"], b"fo");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"Zm8=");
}

#[test]
fn test_block_size_does_not_change_output() {
    let input: Vec<u8> = (0..10_000).map(|i| (i % 253) as u8).collect();
    let default = run_stdin(&[], &input);
    let tiny = run_stdin(&["--block-size", "3"], &input);
    let odd = run_stdin(&["-b", "1000"], &input);
    assert!(default.status.success());
    assert_eq!(default.stdout, tiny.stdout);
    assert_eq!(default.stdout, odd.stdout);
    assert_eq!(default.stdout.len(), 4 * 10_000usize.div_ceil(3));
}

#[test]
fn test_block_size_too_small_rejected() {
    let output = run_stdin(&["-b", "2"], b"abc");
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("block size must be between 3 and 268435456"),
        "{}",
        stderr
    );
}

#[test]
fn test_block_size_too_large_rejected() {
    for size in ["268435457", "99999999999999999", "18446744073709551615"] {
        let output = run_stdin(&["-b", size], b"foo");
        assert_eq!(output.status.code(), Some(1), "block size {}", size);
        assert!(output.stdout.is_empty());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("invalid value"), "{}", stderr);
        assert!(stderr.contains("block size"), "{}", stderr);
    }
}

#[test]
fn test_file_argument() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("input.bin");
    std::fs::write(&file_path, b"Hello World").unwrap();

    let output = bin().arg(&file_path).output().unwrap();
    assert!(output.status.success());
    assert_eq!(output.stdout, b"SGVsbG8gV29ybGQ=");
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("nope.bin");

    let output = bin().arg(&file_path).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("b64enc: "), "{}", stderr);
    assert!(stderr.contains("No such file or directory"), "{}", stderr);
    assert!(!stderr.contains("os error"), "{}", stderr);
}

#[cfg(unix)]
#[test]
fn test_directory_argument() {
    let dir = tempfile::tempdir().unwrap();
    let output = bin().arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Is a directory"), "{}", stderr);
}

#[test]
fn test_extra_operand_rejected() {
    let output = bin().args(["a", "b"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_help_exits_zero() {
    let output = bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--block-size"), "{}", stdout);
}

#[test]
fn test_version_exits_zero() {
    let output = bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{}", stdout);
}
