// Error types for mtr-trace

use std::time::Duration;
use thiserror::Error;

/// Main error type for probe runs
#[derive(Error, Debug)]
pub enum MtrError {
    #[error("Target is not a valid IPv4 or IPv6 address: {0}")]
    InvalidTarget(String),

    /// mtr exited with a non-zero (or abnormal) status.
    #[error("Error: {stderr}")]
    ProbeFailed { stderr: String },

    #[error("Failed to execute command: {0}")]
    CommandExecution(String),

    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using MtrError
pub type MtrResult<T> = Result<T, MtrError>;

impl MtrError {
    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            MtrError::InvalidTarget(target) => {
                format!("Invalid target '{}'. Provide an IPv4 or IPv6 address literal.", target)
            }
            MtrError::ProbeFailed { stderr } => {
                format!("mtr reported an error: {}", stderr.trim())
            }
            MtrError::CommandExecution(cmd) => {
                format!("Failed to execute command. Make sure {} is installed.", cmd)
            }
            MtrError::Timeout(limit) => {
                format!("mtr did not finish within {:?} and was stopped.", limit)
            }
            MtrError::Io(_) => "File system error. Check permissions and disk space.".to_string(),
            MtrError::Serialization(_) => {
                "Data format error. This might be a bug, please report it.".to_string()
            }
        }
    }

    /// True for errors raised before any subprocess was started
    pub fn is_configuration(&self) -> bool {
        matches!(self, MtrError::InvalidTarget(_))
    }
}
