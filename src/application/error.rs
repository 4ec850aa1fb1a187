//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Python 3 is not installed or not on PATH (tried: {})", candidates.join(", "))]
    InterpreterNotFound { candidates: Vec<String> },

    #[error("project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    #[error("virtual environment at {0} has no interpreter; delete it and re-run")]
    BrokenEnvironment(PathBuf),

    #[error("{step} failed ({})", exit_status(*code))]
    CommandFailed { step: String, code: Option<i32> },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
