//! Integration tests for Settings layered loading.
//!
//! These tests pass an explicit global config path, so the user's real
//! XDG config never leaks in. RICE_SETUP_* overrides are covered in
//! `config_env_test.rs`, which runs as its own process.

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use rice_setup::application::ApplicationError;
use rice_setup::config::{local_config_path, Settings, LOCAL_CONFIG_FILE};

#[test]
fn given_no_config_files_when_load_then_uses_defaults() {
    let project = TempDir::new().unwrap();

    let settings = Settings::load_layers(None, Some(project.path())).expect("load settings");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_global_config_when_load_then_overrides_defaults() {
    // Arrange
    let global_dir = TempDir::new().unwrap();
    let global = global_dir.path().join("rice-setup.toml");
    fs::write(
        &global,
        r#"
python = ["python3.12", "python3"]
pip_args = ["--no-cache-dir"]
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_layers(Some(&global), None).expect("load settings");

    // Assert
    assert_eq!(settings.python, vec!["python3.12", "python3"]);
    assert_eq!(settings.pip_args, vec!["--no-cache-dir"]);
    assert_eq!(settings.venv_dir, PathBuf::from("venv"));
}

#[test]
fn given_global_and_local_config_when_load_then_local_wins() {
    // Arrange
    let global_dir = TempDir::new().unwrap();
    let global = global_dir.path().join("rice-setup.toml");
    fs::write(&global, "venv_dir = \"global-venv\"\nupgrade_pip = false\n").unwrap();

    let project = TempDir::new().unwrap();
    fs::write(
        project.path().join(LOCAL_CONFIG_FILE),
        "venv_dir = \".venv\"\nentry_point = \"bot.py\"\n",
    )
    .unwrap();

    // Act
    let settings =
        Settings::load_layers(Some(&global), Some(project.path())).expect("load settings");

    // Assert
    assert_eq!(settings.venv_dir, PathBuf::from(".venv"));
    assert_eq!(settings.entry_point, "bot.py");
    // Not overridden locally, so the global value stays
    assert!(!settings.upgrade_pip);
}

#[test]
fn given_malformed_local_config_when_load_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "venv_dir = [not toml").unwrap();

    let result = Settings::load_layers(None, Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_wrong_type_in_config_when_load_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "upgrade_pip = \"maybe\"\n").unwrap();

    let result = Settings::load_layers(None, Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_empty_interpreter_list_when_load_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "python = []\n").unwrap();

    let result = Settings::load_layers(None, Some(project.path()));

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}

#[test]
fn given_effective_settings_when_to_toml_then_parses_back() {
    let settings = Settings {
        venv_dir: PathBuf::from(".venv"),
        pip_args: vec!["--quiet".into()],
        ..Settings::default()
    };

    let text = settings.to_toml().unwrap();
    let parsed: Settings = toml::from_str(&text).unwrap();

    assert_eq!(parsed, settings);
}

#[test]
fn given_template_when_parsed_then_yields_defaults() {
    let parsed: Settings = toml::from_str(&Settings::template()).unwrap();

    assert_eq!(parsed, Settings::default());
}
