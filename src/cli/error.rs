//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::InterpreterNotFound { .. } => {
                        crate::exitcode::MISSING_INTERPRETER
                    }
                    ApplicationError::CommandFailed { code, .. } => match code {
                        Some(c) if *c != 0 => *c,
                        Some(_) => crate::exitcode::SOFTWARE,
                        None => crate::exitcode::CHILD_SIGNALED,
                    },
                    ApplicationError::ProjectNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                    ApplicationError::BrokenEnvironment(_) | ApplicationError::Domain(_) => {
                        crate::exitcode::SOFTWARE
                    }
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_interpreter_then_exit_code_is_one() {
        let err = CliError::from(ApplicationError::InterpreterNotFound {
            candidates: vec!["python3".into()],
        });
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn given_failed_pip_then_child_exit_code_propagates() {
        let err = CliError::from(ApplicationError::CommandFailed {
            step: "dependency installation".into(),
            code: Some(2),
        });
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn given_signaled_child_then_exit_code_is_nonzero() {
        let err = CliError::from(ApplicationError::CommandFailed {
            step: "installer upgrade".into(),
            code: None,
        });
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn given_usage_error_then_exit_code_is_usage() {
        let err = CliError::Usage("cannot determine executable directory".into());
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_config_error_then_exit_code_is_config() {
        let err = CliError::from(ApplicationError::Config {
            message: "bad".into(),
        });
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }
}
