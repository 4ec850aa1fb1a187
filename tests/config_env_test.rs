//! RICE_SETUP_* environment overrides.
//!
//! Kept in its own test binary: it mutates the process environment, which
//! would race with the file-only tests in `config_test.rs`.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tempfile::TempDir;

use rice_setup::config::{Settings, LOCAL_CONFIG_FILE};

static ENV_LOCK: Mutex<()> = Mutex::new(());

const VARS: [&str; 3] = [
    "RICE_SETUP_VENV_DIR",
    "RICE_SETUP_PYTHON",
    "RICE_SETUP_UPGRADE_PIP",
];

#[test]
fn given_env_overrides_and_local_config_when_load_then_env_wins() {
    // Arrange
    let _guard = ENV_LOCK.lock().unwrap();
    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join(LOCAL_CONFIG_FILE),
        "venv_dir = \".venv-local\"\npython = [\"python3\"]\nupgrade_pip = true\n",
    )
    .unwrap();
    std::env::set_var("RICE_SETUP_VENV_DIR", ".venv-env");
    std::env::set_var("RICE_SETUP_PYTHON", "python3.12,python3");
    std::env::set_var("RICE_SETUP_UPGRADE_PIP", "false");

    // Act
    let result = Settings::load_layers(None, Some(project.path()));
    for var in VARS {
        std::env::remove_var(var);
    }

    // Assert
    let settings = result.expect("load settings");
    assert_eq!(settings.venv_dir, PathBuf::from(".venv-env"));
    assert_eq!(settings.python, vec!["python3.12", "python3"]);
    assert!(!settings.upgrade_pip);
    // Not overridden anywhere
    assert_eq!(settings.requirements, PathBuf::from("requirements.txt"));
}

#[test]
fn given_single_interpreter_in_env_when_load_then_one_element_list() {
    let _guard = ENV_LOCK.lock().unwrap();
    let project = TempDir::new().unwrap();
    std::env::set_var("RICE_SETUP_PYTHON", "python3.11");

    let result = Settings::load_layers(None, Some(project.path()));
    std::env::remove_var("RICE_SETUP_PYTHON");

    assert_eq!(result.expect("load settings").python, vec!["python3.11"]);
}
