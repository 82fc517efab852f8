//! Integration tests for the resize invoker
//!
//! Each test writes a small shell script standing in for the resizer
//! executable and runs real child processes against it.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose, Engine};
use tempfile::TempDir;
use tokio::sync::{Mutex, MutexGuard};

use resizer_invoker::{
    handle, resize, DelegateEnv, Invoker, InvokerConfig, OptionName, OptionSet, ResizeError,
    ResizeEvent, ResizeRequest,
};

/// Serializes tests so no script is open for writing while another test forks
async fn exclusive() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().await
}

/// A fake delegate living in its own temp directory
struct FakeDelegate {
    dir: TempDir,
    path: PathBuf,
}

impl FakeDelegate {
    fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resizer");

        let script = format!("#!/bin/sh\n{}\n", body.replace("$DIR", &dir.path().display().to_string()));
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir, path }
    }

    fn dir(&self) -> &Path {
        self.dir.path()
    }

    fn invoker(&self) -> Invoker {
        Invoker::new(self.config())
    }

    fn config(&self) -> InvokerConfig {
        InvokerConfig {
            binary: self.path.clone(),
            timeout: Duration::from_secs(10),
            ..Default::default()
        }
    }

    /// Arguments the delegate was called with, one per line
    fn recorded_args(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir().join("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

fn request(key: &str) -> ResizeRequest {
    ResizeRequest::new("bucket", key, OptionSet::new()).unwrap()
}

#[tokio::test]
async fn test_success_returns_base64_of_stdout() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(r"printf 'hello image'");

    let encoded = delegate.invoker().resize(&request("a.jpg")).await.unwrap();

    assert_eq!(encoded, "aGVsbG8gaW1hZ2U=");
}

#[tokio::test]
async fn test_binary_output_round_trips() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(r"printf '\377\330\377\340\000\001\012\015'");

    let encoded = delegate.invoker().resize(&request("a.jpg")).await.unwrap();
    let decoded = general_purpose::STANDARD.decode(encoded).unwrap();

    assert_eq!(decoded, vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x01, 0x0a, 0x0d]);
}

#[tokio::test]
async fn test_chunks_arriving_over_time_keep_order() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(
        "printf 'first-'\nsleep 0.1\nprintf 'second-'\nsleep 0.1\nprintf 'third'",
    );

    let image = delegate.invoker().run(&request("a.jpg")).await.unwrap();

    assert_eq!(&image[..], b"first-second-third");
}

#[tokio::test]
async fn test_non_zero_exit_is_delegate_failure() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new("printf 'partial bytes'\nexit 3");

    let err = delegate.invoker().resize(&request("a.jpg")).await.unwrap_err();

    assert!(matches!(err, ResizeError::DelegateFailure { code: 3 }));
    assert_eq!(err.exit_code(), Some(3));
}

#[tokio::test]
async fn test_killed_delegate_is_terminated() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new("kill -9 $$");

    let err = delegate.invoker().resize(&request("a.jpg")).await.unwrap_err();

    assert!(matches!(err, ResizeError::DelegateTerminated));
}

#[tokio::test]
async fn test_stdin_is_closed() {
    let _guard = exclusive().await;
    // cat would block forever on an open stdin
    let delegate = FakeDelegate::new("cat");

    let encoded = delegate.invoker().resize(&request("a.jpg")).await.unwrap();

    assert_eq!(encoded, "");
}

#[tokio::test]
async fn test_slow_delegate_times_out() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new("echo $$ > \"$DIR/pid\"\nexec sleep 5");
    let invoker = Invoker::new(InvokerConfig {
        timeout: Duration::from_millis(500),
        ..delegate.config()
    });

    let start = Instant::now();
    let err = invoker.resize(&request("a.jpg")).await.unwrap_err();

    assert!(matches!(err, ResizeError::Timeout(_)));
    assert!(start.elapsed() < Duration::from_secs(4));

    // Killed and waited on: not even a zombie is left behind
    let pid = std::fs::read_to_string(delegate.dir().join("pid")).unwrap();
    let alive = std::process::Command::new("sh")
        .arg("-c")
        .arg(format!("kill -0 {}", pid.trim()))
        .stderr(std::process::Stdio::null())
        .status()
        .unwrap();
    assert!(!alive.success());
}

#[tokio::test]
async fn test_oversized_output_is_rejected() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new("head -c 65536 /dev/zero");
    let invoker = Invoker::new(InvokerConfig {
        max_output_bytes: 1024,
        ..delegate.config()
    });

    let err = invoker.resize(&request("a.jpg")).await.unwrap_err();

    assert!(matches!(err, ResizeError::BufferLimitExceeded { limit: 1024 }));
}

#[tokio::test]
async fn test_delegate_receives_built_arguments() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(r#"printf '%s\n' "$@" > "$DIR/args""#);

    let options = OptionSet::new()
        .with(OptionName::MaxWidth, 320u32)
        .with(OptionName::Format, "png")
        .with(OptionName::S3ReadMethod, "https");
    resize("bucket", "dir/photo.jpg", options, delegate.config())
        .await
        .unwrap();

    assert_eq!(
        delegate.recorded_args(),
        vec![
            "--s3-bucket=bucket",
            "--s3-key=dir/photo.jpg",
            "--max-width=320",
            "--format=png",
            "--s3-read-method=https",
        ]
    );
}

#[tokio::test]
async fn test_verbose_is_forwarded() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(r#"printf '%s\n' "$@" > "$DIR/args""#);
    let invoker = Invoker::new(InvokerConfig {
        verbose: true,
        ..delegate.config()
    });

    invoker.resize(&request("a.jpg")).await.unwrap();

    assert_eq!(delegate.recorded_args().last().map(String::as_str), Some("--verbose"));
}

#[tokio::test]
async fn test_handle_event_end_to_end() {
    let _guard = exclusive().await;
    let delegate = FakeDelegate::new(r#"printf '%s\n' "$@" > "$DIR/args"
printf 'resized'"#);

    let event: ResizeEvent =
        serde_json::from_str(r#"{"key":"photo.jpg","maxWidth":200}"#).unwrap();
    let env = DelegateEnv::from_vars([("S3_BUCKET", "mybucket")]).unwrap();

    let encoded = handle(event, &env, &delegate.invoker()).await.unwrap();

    assert_eq!(encoded, general_purpose::STANDARD.encode("resized"));
    assert_eq!(
        delegate.recorded_args(),
        vec![
            "--s3-bucket=mybucket",
            "--s3-key=photo.jpg",
            "--max-width=200",
        ]
    );
}
