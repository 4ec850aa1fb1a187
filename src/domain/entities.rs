//! Domain entities: core data structures

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::domain::DomainError;

/// Major version the bootstrapper accepts.
pub const REQUIRED_PYTHON_MAJOR: u32 = 3;

/// Version reported by `python --version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    /// Parse the output of `python --version`.
    ///
    /// Accepts `Python 3.11.4`, `Python 3.13.0rc1` and `Python 2.7` (patch defaults to 0).
    /// Leading/trailing noise is ignored; the first match wins.
    pub fn parse(output: &str) -> Result<Self, DomainError> {
        let re = Regex::new(r"Python\s+(\d+)\.(\d+)(?:\.(\d+))?")
            .map_err(|_| DomainError::InvalidVersion(output.to_string()))?;
        let caps = re
            .captures(output)
            .ok_or_else(|| DomainError::InvalidVersion(output.trim().to_string()))?;

        let number = |idx: usize| -> Result<u32, DomainError> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| DomainError::InvalidVersion(output.trim().to_string())),
                None => Ok(0),
            }
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
        })
    }

    /// Fail unless this is a Python 3 interpreter.
    pub fn ensure_supported(self) -> Result<Self, DomainError> {
        if self.major == REQUIRED_PYTHON_MAJOR {
            Ok(self)
        } else {
            Err(DomainError::UnsupportedPython {
                found: self,
                required: REQUIRED_PYTHON_MAJOR,
            })
        }
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A Python interpreter found on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    /// Absolute path of the executable
    pub path: PathBuf,
    /// Version it reported
    pub version: PythonVersion,
}

/// Whether the bootstrap created the environment or found it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvState {
    Created,
    Existing,
}

/// Environment-variable changes that make commands target a virtual environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    /// Variables to set in child processes
    pub set: Vec<(String, OsString)>,
    /// Variables to remove from child processes
    pub remove: Vec<String>,
}

/// An isolated Python environment rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualEnv {
    pub root: PathBuf,
}

impl VirtualEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the environment's executables (`bin` or `Scripts`).
    pub fn scripts_dir(&self) -> PathBuf {
        self.root.join(scripts_dir_name())
    }

    /// The environment's own interpreter.
    pub fn python(&self) -> PathBuf {
        let exe = if cfg!(windows) { "python.exe" } else { "python" };
        self.scripts_dir().join(exe)
    }

    /// Shell command an operator types to activate the environment.
    ///
    /// `display_root` is how the environment directory is shown (usually relative).
    pub fn activate_command(display_root: &Path) -> String {
        if cfg!(windows) {
            format!("{}\\Scripts\\activate", display_root.display())
        } else {
            format!("source {}/bin/activate", display_root.display())
        }
    }

    /// Build the activation environment, prepending the scripts dir to `current_path`.
    pub fn activation(&self, current_path: Option<&OsStr>) -> Result<Activation, DomainError> {
        let scripts = self.scripts_dir();
        let existing: Vec<PathBuf> = current_path
            .map(|p| std::env::split_paths(p).collect())
            .unwrap_or_default();
        let path = std::env::join_paths(std::iter::once(scripts).chain(existing))
            .map_err(|e| DomainError::InvalidSearchPath(e.to_string()))?;

        Ok(Activation {
            set: vec![
                ("VIRTUAL_ENV".to_string(), self.root.clone().into_os_string()),
                ("PATH".to_string(), path),
            ],
            remove: vec!["PYTHONHOME".to_string()],
        })
    }
}

fn scripts_dir_name() -> &'static str {
    if cfg!(windows) {
        "Scripts"
    } else {
        "bin"
    }
}

/// Notifications emitted while the bootstrap runs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapEvent {
    InterpreterFound(Interpreter),
    CreatingEnvironment(PathBuf),
    EnvironmentExists(PathBuf),
    Activated(PathBuf),
    UpgradingInstaller,
    InstallerUpgradeSkipped,
    ManifestMissing(PathBuf),
    InstallingDependencies { manifest: PathBuf, requirements: usize },
}

/// Expand `~`, `$VAR` and `${VAR}` in a path-like string.
///
/// Unknown variables leave the input unchanged.
pub fn expand_env_vars(path: &str) -> String {
    shellexpand::full(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_virtual_env_when_python_then_lives_in_scripts_dir() {
        let venv = VirtualEnv::new("/srv/rice/venv");
        assert!(venv.python().starts_with(venv.scripts_dir()));
        assert!(venv.scripts_dir().starts_with("/srv/rice/venv"));
    }

    #[test]
    fn given_existing_path_when_activation_then_scripts_dir_comes_first() {
        let venv = VirtualEnv::new("/srv/rice/venv");
        let original = std::env::join_paths(["/usr/bin", "/bin"]).unwrap();

        let activation = venv.activation(Some(original.as_os_str())).unwrap();

        let (_, path) = activation
            .set
            .iter()
            .find(|(k, _)| k == "PATH")
            .expect("PATH is set");
        let entries: Vec<PathBuf> = std::env::split_paths(path).collect();
        assert_eq!(entries[0], venv.scripts_dir());
        assert_eq!(entries.len(), 3);
        assert!(activation.remove.contains(&"PYTHONHOME".to_string()));
    }

    #[test]
    fn given_no_path_when_activation_then_only_scripts_dir() {
        let venv = VirtualEnv::new("venv");
        let activation = venv.activation(None).unwrap();
        let virtual_env = activation
            .set
            .iter()
            .find(|(k, _)| k == "VIRTUAL_ENV")
            .map(|(_, v)| v.clone());
        assert_eq!(virtual_env, Some(OsString::from("venv")));
    }

    #[test]
    fn given_python2_when_ensure_supported_then_rejected() {
        let v = PythonVersion::parse("Python 2.7.18").unwrap();
        assert!(matches!(
            v.ensure_supported(),
            Err(DomainError::UnsupportedPython { required: 3, .. })
        ));
    }
}
