//! Environment bootstrap service
//!
//! Runs the fixed setup sequence for the Rice Scoring Service:
//! interpreter check, idempotent venv creation, activation, installer
//! upgrade and dependency installation. Every step blocks until done and the
//! first failure stops the sequence; nothing is rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    Activation, BootstrapEvent, EnvState, Interpreter, Manifest, PythonVersion, VirtualEnv,
};
use crate::infrastructure::traits::{CommandRunner, FileSystem, Invocation};

/// File the Rice Scoring Service reads `BOT_TOKEN` from.
pub const DOTENV_FILE: &str = ".env";

/// Outcome of a successful bootstrap.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub project_dir: PathBuf,
    pub interpreter: Interpreter,
    pub venv: VirtualEnv,
    pub env_state: EnvState,
    /// Parsed manifest, `None` when the file could not be read
    pub manifest: Option<Manifest>,
}

/// Read-only view of a project's bootstrap state.
#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub project_dir: PathBuf,
    pub venv: VirtualEnv,
    pub venv_exists: bool,
    pub venv_usable: bool,
    pub interpreter: Option<Interpreter>,
    pub manifest_path: PathBuf,
    pub manifest: Option<Manifest>,
    pub dotenv_exists: bool,
}

/// Service that prepares a project's Python environment.
pub struct BootstrapService {
    fs: Arc<dyn FileSystem>,
    cmd: Arc<dyn CommandRunner>,
    settings: Arc<Settings>,
}

impl BootstrapService {
    /// Create a new bootstrap service.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        cmd: Arc<dyn CommandRunner>,
        settings: Arc<Settings>,
    ) -> Self {
        Self { fs, cmd, settings }
    }

    /// Virtual environment location for a project.
    pub fn venv(&self, project_dir: &Path) -> VirtualEnv {
        VirtualEnv::new(project_dir.join(&self.settings.venv_dir))
    }

    /// Manifest location for a project.
    pub fn manifest_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.settings.requirements)
    }

    /// Canonicalize the project directory and make it the working directory.
    pub fn enter_project(&self, dir: &Path) -> ApplicationResult<PathBuf> {
        if !self.fs.is_dir(dir) {
            return Err(ApplicationError::ProjectNotFound(dir.to_path_buf()));
        }
        let project_dir = self
            .fs
            .canonicalize(dir)
            .with_path_context("canonicalize project directory", dir)?;
        self.fs
            .set_current_dir(&project_dir)
            .with_path_context("change directory", &project_dir)?;
        debug!("enter_project: cwd={}", project_dir.display());
        Ok(project_dir)
    }

    /// Find the first configured candidate that is a Python 3 interpreter.
    pub fn locate_interpreter(&self) -> ApplicationResult<Interpreter> {
        for candidate in &self.settings.python {
            let Some(path) = self.cmd.which(candidate) else {
                debug!("locate_interpreter: {} not on PATH", candidate);
                continue;
            };
            match self.probe(&path) {
                Ok(interpreter) => {
                    info!(
                        "locate_interpreter: using {} ({})",
                        interpreter.path.display(),
                        interpreter.version
                    );
                    return Ok(interpreter);
                }
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }

        Err(ApplicationError::InterpreterNotFound {
            candidates: self.settings.python.clone(),
        })
    }

    fn probe(&self, path: &Path) -> ApplicationResult<Interpreter> {
        let out = self
            .cmd
            .output(&Invocation::new(path).arg("--version"))
            .with_path_context("run interpreter", path)?;
        if !out.success() {
            return Err(ApplicationError::CommandFailed {
                step: format!("{} --version", path.display()),
                code: out.code,
            });
        }

        // Python < 3.4 prints its version on stderr
        let text = format!("{}\n{}", out.stdout, out.stderr);
        let version = PythonVersion::parse(&text)?.ensure_supported()?;
        Ok(Interpreter {
            path: path.to_path_buf(),
            version,
        })
    }

    /// Create the virtual environment unless its directory already exists.
    pub fn ensure_environment(
        &self,
        project_dir: &Path,
        interpreter: &Interpreter,
        on_event: &mut dyn FnMut(BootstrapEvent),
    ) -> ApplicationResult<(VirtualEnv, EnvState)> {
        let venv = self.venv(project_dir);

        if self.fs.is_dir(&venv.root) {
            debug!("ensure_environment: {} exists", venv.root.display());
            on_event(BootstrapEvent::EnvironmentExists(venv.root.clone()));
            return Ok((venv, EnvState::Existing));
        }

        on_event(BootstrapEvent::CreatingEnvironment(venv.root.clone()));
        let invocation = Invocation::new(&interpreter.path)
            .args(["-m", "venv"])
            .arg(&self.settings.venv_dir)
            .current_dir(project_dir);
        self.run_step("virtual environment creation", &invocation)?;

        Ok((venv, EnvState::Created))
    }

    /// Compute the activation environment for an existing venv.
    pub fn activate(&self, venv: &VirtualEnv) -> ApplicationResult<Activation> {
        if !self.fs.is_file(&venv.python()) {
            return Err(ApplicationError::BrokenEnvironment(venv.root.clone()));
        }
        let path = std::env::var_os("PATH");
        Ok(venv.activation(path.as_deref())?)
    }

    /// Upgrade pip inside the environment.
    pub fn upgrade_installer(
        &self,
        project_dir: &Path,
        venv: &VirtualEnv,
        activation: &Activation,
    ) -> ApplicationResult<()> {
        let invocation = pip(project_dir, venv, activation).args(["install", "--upgrade", "pip"]);
        self.run_step("installer upgrade", &invocation)
    }

    /// Install the manifest into the environment.
    ///
    /// A missing manifest is reported but pip still runs, so its exit code
    /// is what the caller sees.
    pub fn install_dependencies(
        &self,
        project_dir: &Path,
        venv: &VirtualEnv,
        activation: &Activation,
        on_event: &mut dyn FnMut(BootstrapEvent),
    ) -> ApplicationResult<Option<Manifest>> {
        let manifest_path = self.manifest_path(project_dir);
        let manifest = self.read_manifest(&manifest_path)?;

        match &manifest {
            Some(m) => {
                debug!("install_dependencies: {:?}", m.names());
                on_event(BootstrapEvent::InstallingDependencies {
                    manifest: manifest_path.clone(),
                    requirements: m.entry_count(),
                });
            }
            None => on_event(BootstrapEvent::ManifestMissing(manifest_path.clone())),
        }

        let invocation = pip(project_dir, venv, activation)
            .args(["install", "-r"])
            .arg(&self.settings.requirements)
            .args(&self.settings.pip_args);
        self.run_step("dependency installation", &invocation)?;

        Ok(manifest)
    }

    /// Run the whole sequence against an already-entered project directory.
    pub fn run(
        &self,
        project_dir: &Path,
        on_event: &mut dyn FnMut(BootstrapEvent),
    ) -> ApplicationResult<BootstrapReport> {
        let interpreter = self.locate_interpreter()?;
        on_event(BootstrapEvent::InterpreterFound(interpreter.clone()));

        let (venv, env_state) = self.ensure_environment(project_dir, &interpreter, on_event)?;

        let activation = self.activate(&venv)?;
        on_event(BootstrapEvent::Activated(venv.python()));

        if self.settings.upgrade_pip {
            on_event(BootstrapEvent::UpgradingInstaller);
            self.upgrade_installer(project_dir, &venv, &activation)?;
        } else {
            on_event(BootstrapEvent::InstallerUpgradeSkipped);
        }

        let manifest = self.install_dependencies(project_dir, &venv, &activation, on_event)?;

        Ok(BootstrapReport {
            project_dir: project_dir.to_path_buf(),
            interpreter,
            venv,
            env_state,
            manifest,
        })
    }

    /// Inspect a project without changing anything.
    pub fn status(&self, project_dir: &Path) -> ApplicationResult<ProjectStatus> {
        let venv = self.venv(project_dir);
        let manifest_path = self.manifest_path(project_dir);
        let manifest = self.read_manifest(&manifest_path)?;
        let interpreter = self.locate_interpreter().ok();

        Ok(ProjectStatus {
            project_dir: project_dir.to_path_buf(),
            venv_exists: self.fs.is_dir(&venv.root),
            venv_usable: self.fs.is_file(&venv.python()),
            venv,
            interpreter,
            manifest_path,
            manifest,
            dotenv_exists: self.fs.exists(&project_dir.join(DOTENV_FILE)),
        })
    }

    fn read_manifest(&self, path: &Path) -> ApplicationResult<Option<Manifest>> {
        if !self.fs.is_file(path) {
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read manifest", path)?;
        Ok(Some(Manifest::parse(&content)?))
    }

    fn run_step(&self, step: &str, invocation: &Invocation) -> ApplicationResult<()> {
        debug!("run_step: {}: {}", step, invocation.display());
        let code = self
            .cmd
            .status(invocation)
            .with_path_context(step, &invocation.program)?;
        if code == Some(0) {
            Ok(())
        } else {
            Err(ApplicationError::CommandFailed {
                step: step.to_string(),
                code,
            })
        }
    }
}

/// `<venv python> -m pip` with the activation environment applied.
fn pip(project_dir: &Path, venv: &VirtualEnv, activation: &Activation) -> Invocation {
    let mut invocation = Invocation::new(venv.python())
        .args(["-m", "pip"])
        .current_dir(project_dir);
    for key in &activation.remove {
        invocation = invocation.env_remove(key);
    }
    for (key, value) in &activation.set {
        invocation = invocation.env(key, value);
    }
    invocation
}
