//! Delegate process execution
//!
//! Spawns the external resizer once per request, collects its stdout and
//! turns the exit status into a result.

use crate::error::ResizeError;
use crate::options::OptionSet;
use crate::output::{drain, OutputBuffer};
use crate::request::ResizeRequest;
use base64::{engine::general_purpose, Engine};
use bytes::Bytes;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, error, info, warn};

/// Default location of the delegate, relative to the task root
pub const DEFAULT_BINARY: &str = "./resizer.linux.x86";

/// Invoker configuration
#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Path to the delegate executable
    pub binary: PathBuf,
    /// Upper bound on how long the delegate may run
    pub timeout: Duration,
    /// Largest image the delegate may write to stdout
    pub max_output_bytes: usize,
    /// Pass `--verbose` to the delegate
    pub verbose: bool,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            timeout: Duration::from_secs(30),
            max_output_bytes: 32 * 1024 * 1024,
            verbose: false,
        }
    }
}

/// Runs the delegate for resize requests
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    config: InvokerConfig,
}

impl Invoker {
    pub fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Full delegate argument list for a request
    pub fn args(&self, request: &ResizeRequest) -> Vec<String> {
        let mut args = request.args();
        if self.config.verbose {
            args.push("--verbose".to_string());
        }
        args
    }

    /// Resize and return the base64-encoded image
    pub async fn resize(&self, request: &ResizeRequest) -> Result<String, ResizeError> {
        let image = self.run(request).await?;

        info!(bytes = image.len(), "Delegate finished successfully, base64 encoding");
        let encoded = general_purpose::STANDARD.encode(&image);
        info!(encoded_len = encoded.len(), "Base64 encoded, returning");

        Ok(encoded)
    }

    /// Resize and return the raw image bytes
    pub async fn run(&self, request: &ResizeRequest) -> Result<Bytes, ResizeError> {
        info!(
            key = %request.key(),
            options = %request.options(),
            "Starting image resize"
        );

        let args = self.args(request);
        debug!(binary = %self.config.binary.display(), args = ?args, "Spawning delegate");

        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(
                    binary = %self.config.binary.display(),
                    error = %source,
                    "Failed to start delegate"
                );
                ResizeError::Spawn {
                    binary: self.config.binary.clone(),
                    source,
                }
            })?;

        let Some(stdout) = child.stdout.take() else {
            reap(&mut child).await;
            return Err(ResizeError::Stream(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "delegate stdout was not captured",
            )));
        };

        let outcome = tokio::time::timeout(
            self.config.timeout,
            collect(&mut child, stdout, self.config.max_output_bytes),
        )
        .await;

        let (status, output) = match outcome {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                warn!(key = %request.key(), error = %e, "Delegate output failed");
                reap(&mut child).await;
                return Err(e);
            }
            Err(_) => {
                warn!(
                    key = %request.key(),
                    timeout = ?self.config.timeout,
                    "Delegate timed out, killing"
                );
                reap(&mut child).await;
                return Err(ResizeError::Timeout(self.config.timeout));
            }
        };

        match status.code() {
            Some(0) => {
                let image = output.finish();
                debug!(bytes = image.len(), "Combined delegate output");
                Ok(image)
            }
            Some(code) => {
                warn!(
                    key = %request.key(),
                    code,
                    discarded_bytes = output.len(),
                    "Delegate exited with failure"
                );
                Err(ResizeError::DelegateFailure { code })
            }
            None => {
                warn!(key = %request.key(), status = %status, "Delegate terminated by signal");
                Err(ResizeError::DelegateTerminated)
            }
        }
    }
}

/// Resize a single object with a one-off invoker
pub async fn resize(
    bucket: &str,
    key: &str,
    options: OptionSet,
    config: InvokerConfig,
) -> Result<String, ResizeError> {
    let request = ResizeRequest::new(bucket, key, options)?;
    Invoker::new(config).resize(&request).await
}

/// Drain stdout to EOF, then wait for the exit status
async fn collect(
    child: &mut Child,
    stdout: ChildStdout,
    limit: usize,
) -> Result<(ExitStatus, OutputBuffer), ResizeError> {
    let output = drain(stdout, limit).await?;
    let status = child.wait().await.map_err(ResizeError::Wait)?;
    Ok((status, output))
}

/// Kill the delegate if it is still running and wait for it
async fn reap(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Delegate already exited");
    }
}
