//! rice-setup: bootstrap the Rice Scoring Service's Python environment
//!
//! Layering:
//! - `domain`: interpreter versions, venv layout, manifest parsing (no I/O)
//! - `application`: the bootstrap service
//! - `infrastructure`: filesystem/process traits and the service container
//! - `cli`: argument parsing, dispatch and terminal output

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
