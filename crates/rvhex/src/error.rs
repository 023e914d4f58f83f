use std::path::PathBuf;

use thiserror::Error;

/// Conversion errors.
///
/// Only [`Error::DirectoryNotFound`] aborts a batch; everything else is folded
/// into the outcome of the file that produced it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("target directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("`{command}` exited with {}: {}", exit_label(*status), stderr.trim())]
    ToolFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("failed to run `{command}`: {source}")]
    Invocation {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid machine pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Captured error stream of a failed tool, if any.
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Command line associated with the error, if any.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::ToolFailed { command, .. } | Self::Invocation { command, .. } => Some(command),
            _ => None,
        }
    }
}

fn exit_label(status: Option<i32>) -> String {
    status.map_or_else(|| "signal".to_string(), |code| format!("status {code}"))
}

pub type Result<T> = std::result::Result<T, Error>;
