use std::path::PathBuf;
use thiserror::Error;

/// Core error type for hwprobe operations.
///
/// Every variant aborts a run; nothing in the core retries.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("build of {executable} in {dir} failed: {reason}")]
    BuildFailure {
        dir: PathBuf,
        executable: String,
        reason: String,
    },

    #[error("{}subject {path} failed: {reason}", trial_prefix(.trial))]
    SubjectInvocation {
        path: PathBuf,
        /// Zero-based trial index, filled in by the collector.
        trial: Option<u64>,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to export results to {path}: {reason}")]
    Export { path: PathBuf, reason: String },

    #[error("Failed to render plot to {path}: {reason}")]
    Render { path: PathBuf, reason: String },
}

fn trial_prefix(trial: &Option<u64>) -> String {
    trial.map(|t| format!("trial {t}: ")).unwrap_or_default()
}

impl Error {
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Attach the failing trial index to a subject invocation failure.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn at_trial(self, index: u64) -> Self {
        match self {
            Self::SubjectInvocation { path, reason, .. } => Self::SubjectInvocation {
                path,
                trial: Some(index),
                reason,
            },
            other => other,
        }
    }
}
