//! Headliner deploy CLI
//!
//! Entry point for the `headliner-deploy` command-line tool.

use clap::{ArgAction, Parser, Subcommand};
use headliner_deploy::tasks::to_bool;
use headliner_deploy::{
    Deployer, DeployEnv, DevTasks, EnvError, LayeredConfig, RecordingShell, Release, Shell,
    SshConfig, SshShell, TaskError,
};
use headliner_settings::SettingsObj;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::process;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headliner-deploy")]
#[command(about = "Deploy headliner releases and run development tasks", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON config file layered over the built-in defaults
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Host to deploy to (repeatable; replaces deploy.hosts)
    #[arg(long = "host", short = 'H', global = true)]
    hosts: Vec<String>,

    /// Remote login user (overrides deploy.user)
    #[arg(long, global = true)]
    user: Option<String>,

    /// Remote releases directory (overrides deploy.path)
    #[arg(long, global = true)]
    path: Option<String>,

    /// Print the commands instead of running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the releases directory and deploy cold
    Setup,

    /// Deploy code, prune old releases, set symlinks and restart
    Deploy,

    /// Deploy code but don't change the running version
    DeployCold,

    /// Archive, upload and unpack a new release
    Upload,

    /// Swap the current/previous symlinks to a new release
    Symlinks,

    /// Build the environment of a new release
    Virtualenv,

    /// Delete releases beyond deploy.num_keep_releases
    Clean,

    /// Restart the service processes
    Restart,

    /// Run the automated tests
    Test {
        /// nosetests config file (default: dev.nose_config)
        #[arg(long)]
        nose_config: Option<String>,

        /// Drop into the debugger when an exception escapes a test
        #[arg(long, value_parser = to_bool, action = ArgAction::Set, default_value = "false")]
        debug_errors: bool,

        /// Drop into the debugger when an assertion fails
        #[arg(long, value_parser = to_bool, action = ArgAction::Set, default_value = "false")]
        debug_failures: bool,
    },

    /// Run flake8 over the project
    Flake {
        /// flake8 config file (default: dev.flake_config)
        #[arg(long)]
        flake_config: Option<String>,
    },

    /// Build the Python package
    Package {
        /// Remove build/ first
        #[arg(long, value_parser = to_bool, action = ArgAction::Set, default_value = "true")]
        clean: bool,
    },

    /// Test, lint and package
    Build,

    /// Print the merged settings and where they came from
    Settings,
}

#[derive(Clone, Copy)]
enum DeployTask {
    Setup,
    Deploy,
    DeployCold,
    Upload,
    Symlinks,
    Virtualenv,
    Clean,
    Restart,
}

enum DevTask<'a> {
    Test {
        nose_config: Option<&'a str>,
        debug_errors: bool,
        debug_failures: bool,
    },
    Flake {
        flake_config: Option<&'a str>,
    },
    Package {
        clean: bool,
    },
    Build,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("No hosts configured; pass --host or set deploy.hosts")]
    NoHosts,

    #[error("Cannot serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// RUST_LOG wins when set; otherwise INFO, or DEBUG with --verbose.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = LayeredConfig::build(cli.config.as_deref(), Some(cli_overrides(cli)))?;
    for source in &config.sources {
        info!(origin = %source.origin, path = source.path.as_deref().unwrap_or("-"), "config layer");
    }

    let task = match &cli.command {
        Commands::Setup => DeployTask::Setup,
        Commands::Deploy => DeployTask::Deploy,
        Commands::DeployCold => DeployTask::DeployCold,
        Commands::Upload => DeployTask::Upload,
        Commands::Symlinks => DeployTask::Symlinks,
        Commands::Virtualenv => DeployTask::Virtualenv,
        Commands::Clean => DeployTask::Clean,
        Commands::Restart => DeployTask::Restart,
        Commands::Settings => {
            let report = json!({
                "settings": config.settings,
                "sources": config.sources,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
        Commands::Test {
            nose_config,
            debug_errors,
            debug_failures,
        } => {
            let task = DevTask::Test {
                nose_config: nose_config.as_deref(),
                debug_errors: *debug_errors,
                debug_failures: *debug_failures,
            };
            return run_dev(cli, &config, task);
        }
        Commands::Flake { flake_config } => {
            let task = DevTask::Flake {
                flake_config: flake_config.as_deref(),
            };
            return run_dev(cli, &config, task);
        }
        Commands::Package { clean } => {
            return run_dev(cli, &config, DevTask::Package { clean: *clean });
        }
        Commands::Build => return run_dev(cli, &config, DevTask::Build),
    };

    run_deploy(cli, &config.deploy_env()?, task)
}

/// Fold --host/--user/--path into a `deploy` layer
fn cli_overrides(cli: &Cli) -> SettingsObj {
    let mut deploy = Map::new();
    if !cli.hosts.is_empty() {
        deploy.insert("hosts".to_string(), json!(cli.hosts));
    }
    if let Some(ref user) = cli.user {
        deploy.insert("user".to_string(), json!(user));
    }
    if let Some(ref path) = cli.path {
        deploy.insert("path".to_string(), json!(path));
    }

    if deploy.is_empty() {
        SettingsObj::new()
    } else {
        SettingsObj::with_values([("deploy", Value::Object(deploy))])
    }
}

fn run_deploy(cli: &Cli, env: &DeployEnv, task: DeployTask) -> Result<(), CliError> {
    if env.hosts.is_empty() {
        return Err(CliError::NoHosts);
    }

    let release = Release::now();
    info!(release = %release, hosts = env.hosts.len(), "starting");

    for host in &env.hosts {
        let span = info_span!("host", host = %host);
        let _guard = span.enter();

        if cli.dry_run {
            let shell = RecordingShell::new();
            run_deploy_task(&Deployer::new(&shell, env, release.clone()), task)?;
            for invocation in shell.invocations() {
                println!("{}: {}", host, invocation);
            }
        } else {
            let shell = SshShell::new(SshConfig {
                host: host.clone(),
                user: env.user.clone(),
                use_ssh_config: env.use_ssh_config,
                connect_timeout_seconds: env.connect_timeout_seconds,
            });
            run_deploy_task(&Deployer::new(&shell, env, release.clone()), task)?;
        }
    }

    Ok(())
}

fn run_deploy_task<S: Shell>(deployer: &Deployer<'_, S>, task: DeployTask) -> Result<(), TaskError> {
    match task {
        DeployTask::Setup => deployer.setup(),
        DeployTask::Deploy => deployer.deploy(),
        DeployTask::DeployCold => deployer.deploy_cold(),
        DeployTask::Upload => deployer.upload_from_git(),
        DeployTask::Symlinks => deployer.set_symlinks(),
        DeployTask::Virtualenv => deployer.setup_virtualenv(),
        DeployTask::Clean => deployer.clean_release_dir(),
        DeployTask::Restart => deployer.restart_processes(),
    }
}

fn run_dev(cli: &Cli, config: &LayeredConfig, task: DevTask<'_>) -> Result<(), CliError> {
    let env = config.dev_env()?;

    if cli.dry_run {
        let shell = RecordingShell::new();
        run_dev_task(&DevTasks::new(&shell, &env), &task)?;
        for invocation in shell.invocations() {
            println!("{}", invocation);
        }
        Ok(())
    } else {
        let shell = SshShell::local_only();
        run_dev_task(&DevTasks::new(&shell, &env), &task)?;
        Ok(())
    }
}

fn run_dev_task<S: Shell>(tasks: &DevTasks<'_, S>, task: &DevTask<'_>) -> Result<(), TaskError> {
    match *task {
        DevTask::Test {
            nose_config,
            debug_errors,
            debug_failures,
        } => tasks.test(nose_config, debug_errors, debug_failures),
        DevTask::Flake { flake_config } => tasks.flake(flake_config),
        DevTask::Package { clean } => tasks.package(clean),
        DevTask::Build => tasks.build(),
    }
}
