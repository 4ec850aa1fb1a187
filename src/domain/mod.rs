//! Domain layer: entities and business logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;
pub mod manifest;

pub use entities::*;
pub use error::DomainError;
pub use manifest::{Manifest, ManifestLine, Requirement};
