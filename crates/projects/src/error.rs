use std::{path::PathBuf, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("cannot detect context for {path:?}: {message}")]
    ContextDetection { path: PathBuf, message: String },
    #[error("cannot resolve {identifier:?} from {}: {message}", .context_path.display())]
    Resolution {
        identifier: String,
        context_path: PathBuf,
        message: String,
        suggestions: Vec<String>,
    },
    #[error("invalid path argument: {message}")]
    InvalidPathArgument { message: String },
    #[error("failed to execute `{operation}`: {source}")]
    CommandExecution {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("`{operation}` failed: {stderr}")]
    CommandFailed {
        operation: &'static str,
        stderr: String,
    },
    #[error("`{operation}` timed out after {timeout:?}")]
    CommandTimeout {
        operation: &'static str,
        timeout: Duration,
    },
    #[error("{} is not a git repository", .path.display())]
    NotGitRepository { path: PathBuf },
}

impl Error {
    #[must_use]
    pub fn context_detection(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ContextDetection {
            path: path.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn resolution(
        identifier: impl Into<String>,
        context_path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            identifier: identifier.into(),
            context_path: context_path.into(),
            message: message.into(),
            suggestions: crate::types::IDENTIFIER_FORMATS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    #[must_use]
    pub fn invalid_path_argument(message: impl Into<String>) -> Self {
        Self::InvalidPathArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn command_execution(operation: &'static str, source: std::io::Error) -> Self {
        Self::CommandExecution { operation, source }
    }

    #[must_use]
    pub fn command_failed(operation: &'static str, stderr: impl Into<String>) -> Self {
        Self::CommandFailed {
            operation,
            stderr: stderr.into(),
        }
    }

    /// Suggested identifier formats carried by a resolution error.
    #[must_use]
    pub fn suggestions(&self) -> &[String] {
        match self {
            Self::Resolution { suggestions, .. } => suggestions,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
