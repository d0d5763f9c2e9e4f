use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static TEMP_NONCE: AtomicU64 = AtomicU64::new(0);

fn minx_bin() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_minx") {
        return PathBuf::from(path);
    }

    let mut exe = std::env::current_exe().expect("test executable path should be known");
    exe.pop();
    if exe.file_name().and_then(|name| name.to_str()) == Some("deps") {
        exe.pop();
    }
    exe.join("minx")
}

fn temp_source_path(prefix: &str) -> PathBuf {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should move forward")
        .as_nanos();
    let counter = TEMP_NONCE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("{prefix}-{timestamp}-{counter}.minx"))
}

#[test]
fn minx_prints_the_tree_for_a_valid_file() {
    let source = "greeting = \"hello, world\"\n";
    let path = temp_source_path("minx-cli-tree");
    std::fs::write(&path, source).expect("temp source write should succeed");

    let output = Command::new(minx_bin())
        .arg(&path)
        .output()
        .expect("minx should execute");

    let _ = std::fs::remove_file(path);

    assert_eq!(
        output.status.code(),
        Some(0),
        "expected success; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Scope") && stdout.contains("greeting"),
        "expected the printed tree in stdout, got: {stdout}"
    );
}

#[test]
fn minx_reports_a_syntax_error_on_stderr() {
    let source = "x = (a\n";
    let path = temp_source_path("minx-cli-err");
    std::fs::write(&path, source).expect("temp source write should succeed");

    let output = Command::new(minx_bin())
        .arg(&path)
        .output()
        .expect("minx should execute");

    let _ = std::fs::remove_file(path);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("syntax error") && stderr.contains("closing parenthesis"),
        "expected a located syntax error in stderr, got: {stderr}"
    );
}

#[test]
fn minx_debug_loglevel_dumps_the_token_stream() {
    let source = "x = 1\n";
    let path = temp_source_path("minx-cli-tokens");
    std::fs::write(&path, source).expect("temp source write should succeed");

    let output = Command::new(minx_bin())
        .arg(&path)
        .arg("--loglevel")
        .arg("debug")
        .output()
        .expect("minx should execute");

    let _ = std::fs::remove_file(path);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("FileStart") && stdout.contains("FileEnd"),
        "expected the token dump in stdout, got: {stdout}"
    );
}

#[test]
fn minx_test_mode_parses_the_bundled_directory() {
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");

    let output = Command::new(minx_bin())
        .arg("--test")
        .current_dir(workspace_root)
        .output()
        .expect("minx should execute");

    assert_eq!(
        output.status.code(),
        Some(0),
        "expected every bundled file to parse; stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("files parsed"),
        "expected the batch summary in stdout, got: {stdout}"
    );
}
