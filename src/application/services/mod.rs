//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, CommandRunner)
//! but are themselves concrete structs, not traits.

mod bootstrap;

pub use bootstrap::{BootstrapReport, BootstrapService, ProjectStatus, DOTENV_FILE};
