//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::PythonVersion;

/// Domain errors represent violations of the bootstrap rules.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("cannot parse interpreter version from: {0:?}")]
    InvalidVersion(String),

    #[error("Python {found} is not supported, Python {required}.x is required")]
    UnsupportedPython { found: PythonVersion, required: u32 },

    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("cannot build search path: {0}")]
    InvalidSearchPath(String),
}
