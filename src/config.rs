//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/rice-setup/rice-setup.toml`
//! 3. Local config: `<project_dir>/.rice-setup.toml`
//! 4. Environment variables: `RICE_SETUP_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::expand_env_vars;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "RICE_SETUP";

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = ".rice-setup.toml";

/// Unified configuration for rice-setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Virtual environment directory, relative to the project (default: venv)
    pub venv_dir: PathBuf,
    /// Dependency manifest, relative to the project (default: requirements.txt)
    pub requirements: PathBuf,
    /// Interpreter names tried in order (default: ["python3"])
    pub python: Vec<String>,
    /// Upgrade pip before installing dependencies
    pub upgrade_pip: bool,
    /// Extra arguments for `pip install -r`
    pub pip_args: Vec<String>,
    /// Application entry point shown in the completion message
    pub entry_point: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            venv_dir: PathBuf::from("venv"),
            requirements: PathBuf::from("requirements.txt"),
            python: vec!["python3".into()],
            upgrade_pip: true,
            pip_args: vec![],
            entry_point: "main.py".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub venv_dir: Option<PathBuf>,
    pub requirements: Option<PathBuf>,
    pub python: Option<Vec<String>>,
    pub upgrade_pip: Option<bool>,
    pub pip_args: Option<Vec<String>>,
    pub entry_point: Option<String>,
}

/// Get the XDG config directory for rice-setup.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rice-setup").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("rice-setup.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(LOCAL_CONFIG_FILE)
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.venv_dir = PathBuf::from(expand_env_vars(&self.venv_dir.to_string_lossy()));
        self.requirements = PathBuf::from(expand_env_vars(&self.requirements.to_string_lossy()));
    }

    /// Overlay wins field by field where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            venv_dir: overlay
                .venv_dir
                .clone()
                .unwrap_or_else(|| self.venv_dir.clone()),
            requirements: overlay
                .requirements
                .clone()
                .unwrap_or_else(|| self.requirements.clone()),
            python: overlay.python.clone().unwrap_or_else(|| self.python.clone()),
            upgrade_pip: overlay.upgrade_pip.unwrap_or(self.upgrade_pip),
            pip_args: overlay
                .pip_args
                .clone()
                .unwrap_or_else(|| self.pip_args.clone()),
            entry_point: overlay
                .entry_point
                .clone()
                .unwrap_or_else(|| self.entry_point.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory for local config
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_layers(global_config_path().as_deref(), project_dir)
    }

    /// Load settings from an explicit global config path.
    ///
    /// Missing files are skipped; unreadable or malformed files are errors.
    pub fn load_layers(
        global_path: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global) = global_path {
            if global.exists() {
                current = current.merge_with(&load_raw_settings(global)?);
            }
        }

        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply RICE_SETUP_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("python")
                .with_list_parse_key("pip_args"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("venv_dir") {
            settings.venv_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("requirements") {
            settings.requirements = PathBuf::from(val);
        }
        if let Ok(val) = config.get::<Vec<String>>("python") {
            settings.python = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("pip_args") {
            settings.pip_args = val;
        }
        if config.get_string("upgrade_pip").is_ok() {
            settings.upgrade_pip = config.get_bool("upgrade_pip").map_err(config_err)?;
        }
        if let Ok(val) = config.get_string("entry_point") {
            settings.entry_point = val;
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if self.python.iter().all(|p| p.trim().is_empty()) {
            return Err(ApplicationError::Config {
                message: "python: at least one interpreter name is required".into(),
            });
        }
        if self.venv_dir.as_os_str().is_empty() {
            return Err(ApplicationError::Config {
                message: "venv_dir must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# rice-setup configuration
#
# Locations (by precedence, lowest to highest):
#   Global:  ~/.config/rice-setup/rice-setup.toml
#   Local:   <project>/.rice-setup.toml
#   Env:     RICE_SETUP_* environment variables (lists are comma separated)

# Virtual environment directory, relative to the project
# venv_dir = "venv"

# Dependency manifest, relative to the project
# requirements = "requirements.txt"

# Interpreter names searched on PATH, first Python 3 wins
# python = ["python3"]

# Upgrade pip before installing dependencies
# upgrade_pip = true

# Extra arguments passed to `pip install -r <requirements>`
# pip_args = ["--no-cache-dir"]

# Entry point shown in the completion message
# entry_point = "main.py"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_settings_then_match_setup_conventions() {
        let settings = Settings::default();
        assert_eq!(settings.venv_dir, PathBuf::from("venv"));
        assert_eq!(settings.requirements, PathBuf::from("requirements.txt"));
        assert_eq!(settings.python, vec!["python3".to_string()]);
        assert!(settings.upgrade_pip);
        assert!(settings.pip_args.is_empty());
    }

    #[test]
    fn given_partial_overlay_when_merge_then_only_specified_fields_change() {
        let base = Settings::default();
        let overlay = RawSettings {
            venv_dir: Some(PathBuf::from(".venv")),
            upgrade_pip: Some(false),
            ..RawSettings::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.venv_dir, PathBuf::from(".venv"));
        assert!(!merged.upgrade_pip);
        assert_eq!(merged.requirements, base.requirements);
        assert_eq!(merged.python, base.python);
    }

    #[test]
    fn given_tilde_in_requirements_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            requirements: PathBuf::from("~/reqs/requirements.txt"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        assert!(settings.requirements.to_string_lossy().starts_with(&home));
        assert_eq!(settings.venv_dir, PathBuf::from("venv"));
    }

    #[test]
    fn given_empty_python_list_when_validate_then_config_error() {
        let settings = Settings {
            python: vec![],
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { .. })
        ));
    }

    #[test]
    fn given_settings_when_to_toml_then_round_trips_keys() {
        let toml = Settings::default().to_toml().unwrap();
        assert!(toml.contains("venv_dir = \"venv\""));
        assert!(toml.contains("upgrade_pip = true"));
    }
}
