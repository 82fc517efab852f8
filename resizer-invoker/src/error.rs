//! Resize error taxonomy

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Every way a single resize invocation can fail.
///
/// A successful run is `Ok(bytes)`; everything else is one of these variants.
/// Nothing here is retried.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// The delegate ran and exited non-zero.
    #[error("delegate exited with code {code}")]
    DelegateFailure { code: i32 },

    /// The delegate went away without an exit code (killed by a signal).
    #[error("delegate terminated without an exit code")]
    DelegateTerminated,

    #[error("failed to start delegate {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("delegate output stream failed: {0}")]
    Stream(#[source] std::io::Error),

    #[error("failed waiting on delegate: {0}")]
    Wait(#[source] std::io::Error),

    #[error("delegate output exceeded {limit} bytes")]
    BufferLimitExceeded { limit: usize },

    #[error("delegate timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ResizeError {
    /// Exit code of the delegate, if it got far enough to report one
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::DelegateFailure { code } => Some(*code),
            _ => None,
        }
    }

    /// Stable name of the failure kind, used as the error type reported to the caller
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DelegateFailure { .. } => "DelegateFailure",
            Self::DelegateTerminated => "DelegateTerminated",
            Self::Spawn { .. } => "SpawnFailure",
            Self::Stream(_) => "StreamFailure",
            Self::Wait(_) => "WaitFailure",
            Self::BufferLimitExceeded { .. } => "BufferLimitExceeded",
            Self::Timeout(_) => "Timeout",
            Self::InvalidRequest(_) => "InvalidRequest",
        }
    }
}
