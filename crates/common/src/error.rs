//! Error types shared across Beatsync crates.

use std::path::PathBuf;

/// Top-level error type for Beatsync operations.
///
/// Only input-validation failures surface here. Degenerate signals and
/// out-of-range parameters are absorbed by the components themselves.
#[derive(Debug, thiserror::Error)]
pub enum BeatsyncError {
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BeatsyncError.
pub type BeatsyncResult<T> = Result<T, BeatsyncError>;

impl BeatsyncError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether this error came from rejecting caller input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_message() {
        let err = BeatsyncError::invalid_input("bpm must be positive");
        assert!(err.is_invalid_input());
        assert_eq!(err.to_string(), "Invalid input: bpm must be positive");
    }

    #[test]
    fn test_file_not_found_names_path() {
        let err = BeatsyncError::FileNotFound {
            path: PathBuf::from("/tmp/missing.wav"),
        };
        assert!(!err.is_invalid_input());
        assert_eq!(err.to_string(), "File not found: /tmp/missing.wav");
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BeatsyncError = io.into();
        assert!(!err.is_invalid_input());
        assert!(matches!(err, BeatsyncError::Io(_)));
    }
}
