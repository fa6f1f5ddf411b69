//! Error types for the hz-app service layer.

use std::path::PathBuf;

/// Application error type wrapping errors from the backend crates for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read trace file: {path}")]
    TraceFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    #[error("Runtime compilation failed: {0}")]
    Compile(String),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for hz-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<hz_project::ProjectError> for AppError {
    fn from(err: hz_project::ProjectError) -> Self {
        match err {
            hz_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<hz_controls::ControlError> for AppError {
    fn from(err: hz_controls::ControlError) -> Self {
        AppError::Compile(err.to_string())
    }
}
