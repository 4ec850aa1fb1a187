//! Command dispatch and handlers

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use tracing::{debug, info, instrument};

use crate::application::services::{BootstrapReport, DOTENV_FILE};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{BootstrapEvent, VirtualEnv};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        None => cmd_bootstrap(cli),
        Some(Commands::Info) => cmd_info(cli),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(cli),
            ConfigCommands::Path => cmd_config_path(cli),
            ConfigCommands::Template => {
                output::info(&Settings::template());
                Ok(())
            }
        },
        Some(Commands::Completion { shell }) => {
            cmd_completion(*shell);
            Ok(())
        }
    }
}

/// `--project-dir` if given, otherwise the directory holding the executable.
pub fn resolve_project_dir(cli: &Cli) -> CliResult<PathBuf> {
    if let Some(dir) = &cli.project_dir {
        return Ok(dir.clone());
    }
    let exe = std::env::current_exe().map_err(|e| InfraError::io("locate executable", e))?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        CliError::Usage("cannot determine executable directory, pass --project-dir".into())
    })
}

fn build_container(project_dir: &Path) -> CliResult<ServiceContainer> {
    let settings = Settings::load(Some(project_dir))?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

#[instrument(skip(cli))]
fn cmd_bootstrap(cli: &Cli) -> CliResult<()> {
    let dir = resolve_project_dir(cli)?;
    let container = build_container(&dir)?;

    let report = bootstrap_and_report(&container, &dir, &mut io::stdout())?;

    if !report.project_dir.join(DOTENV_FILE).exists() {
        output::warning(&format!(
            "no {} file in {}; the service reads BOT_TOKEN from it",
            DOTENV_FILE,
            report.project_dir.display()
        ));
    }
    Ok(())
}

/// Enter the project directory and run the bootstrap, printing progress.
pub fn run_bootstrap(container: &ServiceContainer, dir: &Path) -> CliResult<BootstrapReport> {
    let service = container.bootstrap_service();

    let project_dir = service.enter_project(dir)?;
    output::action("Project", &project_dir.display());

    let report = service.run(&project_dir, &mut print_event)?;
    info!(
        "bootstrap finished: env={:?}, venv={}",
        report.env_state,
        report.venv.root.display()
    );
    Ok(report)
}

/// Run the bootstrap and write the completion message to `out` only if every step succeeded.
pub fn bootstrap_and_report(
    container: &ServiceContainer,
    dir: &Path,
    out: &mut dyn Write,
) -> CliResult<BootstrapReport> {
    let report = run_bootstrap(container, dir)?;
    writeln!(
        out,
        "\n{} {}",
        "✓".green(),
        completion_message(&container.settings.venv_dir, &container.settings.entry_point)
    )
    .map_err(|e| InfraError::io("write completion message", e))?;
    Ok(report)
}

fn print_event(event: BootstrapEvent) {
    match event {
        BootstrapEvent::InterpreterFound(interpreter) => output::success(&format!(
            "Found Python {} ({})",
            interpreter.version,
            interpreter.path.display()
        )),
        BootstrapEvent::CreatingEnvironment(root) => {
            output::action("Creating", &format!("virtual environment {}", root.display()))
        }
        BootstrapEvent::EnvironmentExists(root) => output::detail(&format!(
            "Virtual environment already exists: {}",
            root.display()
        )),
        BootstrapEvent::Activated(python) => {
            output::action("Activating", &python.display());
        }
        BootstrapEvent::UpgradingInstaller => output::action("Upgrading", &"pip"),
        BootstrapEvent::InstallerUpgradeSkipped => info!("pip upgrade disabled"),
        BootstrapEvent::ManifestMissing(manifest) => {
            output::warning(&format!("manifest not found: {}", manifest.display()))
        }
        BootstrapEvent::InstallingDependencies {
            manifest,
            requirements,
        } => output::action(
            "Installing",
            &format!("{} dependencies from {}", requirements, manifest.display()),
        ),
    }
}

/// Operator instructions printed after a successful run.
pub fn completion_message(venv_dir: &Path, entry_point: &str) -> String {
    format!(
        "Setup complete!\n\
         \n\
         To start the Rice Scoring Service:\n\
         \x20 1. Activate the virtual environment:\n\
         \x20      {}\n\
         \x20 2. Run the application:\n\
         \x20      python {}",
        VirtualEnv::activate_command(venv_dir),
        entry_point
    )
}

#[instrument(skip(cli))]
fn cmd_info(cli: &Cli) -> CliResult<()> {
    let dir = resolve_project_dir(cli)?;
    let container = build_container(&dir)?;
    let status = container.bootstrap_service().status(&dir)?;

    output::header(&"Project");
    output::detail(&status.project_dir.display());

    output::header(&"Interpreter");
    match &status.interpreter {
        Some(i) => output::success(&format!("Python {} ({})", i.version, i.path.display())),
        None => output::failure(&format!(
            "no Python 3 found (tried: {})",
            container.settings.python.join(", ")
        )),
    }

    output::header(&"Virtual environment");
    let state = match (status.venv_exists, status.venv_usable) {
        (false, _) => "missing",
        (true, false) => "broken (no interpreter)",
        (true, true) => "ready",
    };
    output::detail(&format!("{} [{}]", status.venv.root.display(), state));

    output::header(&"Manifest");
    match &status.manifest {
        Some(m) => {
            output::detail(&format!(
                "{} ({} entries)",
                status.manifest_path.display(),
                m.entry_count()
            ));
            for name in m.names() {
                output::detail(&format!("- {name}"));
            }
        }
        None => output::failure(&format!("missing: {}", status.manifest_path.display())),
    }

    if !status.dotenv_exists {
        output::warning(&format!("no {} file; BOT_TOKEN must be provided", DOTENV_FILE));
    }
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> CliResult<()> {
    let dir = resolve_project_dir(cli)?;
    let settings = Settings::load(Some(&dir))?;
    output::info(&settings.to_toml()?);
    Ok(())
}

fn cmd_config_path(cli: &Cli) -> CliResult<()> {
    let dir = resolve_project_dir(cli)?;
    let describe = |path: &Path| {
        let marker = if path.exists() { "exists" } else { "not found" };
        format!("{} ({})", path.display(), marker)
    };

    match global_config_path() {
        Some(path) => output::action("Global", &describe(&path)),
        None => output::action("Global", &"unavailable (no home directory)"),
    }
    output::action("Local", &describe(&local_config_path(&dir)));
    Ok(())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    eprintln!("Generating completion file for {shell:?}...");
    generate(shell, &mut cmd, name, &mut io::stdout());
}
