//! Shell Layer
//!
//! Abstracts where commands run. Provides:
//! - Shell trait: local command, remote command, upload
//! - SshShell: `sh`, `ssh` and `scp` processes for production
//! - RecordingShell: records invocations, for tests and dry runs

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::debug;

/// Where task commands are executed
pub trait Shell {
    /// Run a command on the local machine, returning its stdout
    fn local(&self, command: &str) -> Result<String, ShellError>;

    /// Run a command on the remote host, returning its stdout
    fn run(&self, command: &str) -> Result<String, ShellError>;

    /// Copy a local file into a directory on the remote host
    fn put(&self, local_path: &Path, remote_dir: &str) -> Result<(), ShellError>;
}

/// Shell errors
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("No remote host configured for `{0}`")]
    NoHost(String),
}

/// SSH configuration for one host
#[derive(Debug, Clone)]
pub struct SshConfig {
    /// Remote host (empty for local-only use)
    pub host: String,
    /// SSH user
    pub user: String,
    /// Read ~/.ssh/config; when false it is replaced by /dev/null
    pub use_ssh_config: bool,
    /// Connection timeout in seconds
    pub connect_timeout_seconds: u32,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: "headliner".to_string(),
            use_ssh_config: true,
            connect_timeout_seconds: 30,
        }
    }
}

/// Shell backed by real processes
pub struct SshShell {
    config: SshConfig,
}

impl SshShell {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }

    /// A shell that can only run local commands
    pub fn local_only() -> Self {
        Self::new(SshConfig::default())
    }

    /// Options shared by `ssh` and `scp`
    fn common_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if !self.config.use_ssh_config {
            args.push("-F".to_string());
            args.push("/dev/null".to_string());
        }
        args.push("-o".to_string());
        args.push(format!("ConnectTimeout={}", self.config.connect_timeout_seconds));
        args.push("-o".to_string());
        args.push("BatchMode=yes".to_string());
        args
    }

    fn destination(&self, command: &str) -> Result<String, ShellError> {
        if self.config.host.is_empty() {
            return Err(ShellError::NoHost(command.to_string()));
        }
        Ok(format!("{}@{}", self.config.user, self.config.host))
    }

    /// Build `ssh` arguments for a remote command
    fn ssh_args(&self, command: &str) -> Result<Vec<String>, ShellError> {
        let mut args = self.common_args();
        args.push(self.destination(command)?);
        args.push(command.to_string());
        Ok(args)
    }

    /// Build `scp` arguments for an upload
    fn scp_args(&self, local_path: &Path, remote_dir: &str) -> Result<Vec<String>, ShellError> {
        let mut args = self.common_args();
        args.push(local_path.to_string_lossy().to_string());
        args.push(format!("{}:{}", self.destination(remote_dir)?, remote_dir));
        Ok(args)
    }
}

impl Shell for SshShell {
    fn local(&self, command: &str) -> Result<String, ShellError> {
        debug!(command, "local");
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| ShellError::Spawn { program: "sh", source })?;
        check_output(command, output)
    }

    fn run(&self, command: &str) -> Result<String, ShellError> {
        debug!(host = %self.config.host, command, "run");
        let output = Command::new("ssh")
            .args(self.ssh_args(command)?)
            .output()
            .map_err(|source| ShellError::Spawn { program: "ssh", source })?;
        check_output(command, output)
    }

    fn put(&self, local_path: &Path, remote_dir: &str) -> Result<(), ShellError> {
        debug!(host = %self.config.host, local = %local_path.display(), remote_dir, "put");
        let output = Command::new("scp")
            .args(self.scp_args(local_path, remote_dir)?)
            .output()
            .map_err(|source| ShellError::Spawn { program: "scp", source })?;
        check_output(&format!("put {}", local_path.display()), output).map(|_| ())
    }
}

fn check_output(command: &str, output: Output) -> Result<String, ShellError> {
    if !output.status.success() {
        return Err(ShellError::CommandFailed {
            command: command.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// One recorded shell call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Local(String),
    Run(String),
    Put { local: PathBuf, remote_dir: String },
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local(command) => write!(f, "[local] {}", command),
            Self::Run(command) => write!(f, "[run] {}", command),
            Self::Put { local, remote_dir } => write!(f, "[put] {} -> {}", local.display(), remote_dir),
        }
    }
}

/// Shell that executes nothing and records every call in order
#[derive(Debug, Default)]
pub struct RecordingShell {
    invocations: RefCell<Vec<Invocation>>,
    /// (command prefix, stdout) pairs for remote commands
    outputs: Vec<(String, String)>,
    /// Command prefixes that fail
    failures: Vec<String>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `stdout` for remote commands starting with `prefix`
    pub fn with_output(mut self, prefix: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.outputs.push((prefix.into(), stdout.into()));
        self
    }

    /// Fail local or remote commands starting with `prefix`
    pub fn failing_on(mut self, prefix: impl Into<String>) -> Self {
        self.failures.push(prefix.into());
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Remote commands only
    pub fn remote_commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter_map(|i| match i {
                Invocation::Run(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    /// Local commands only
    pub fn local_commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .filter_map(|i| match i {
                Invocation::Local(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, invocation: Invocation, command: &str) -> Result<(), ShellError> {
        self.invocations.borrow_mut().push(invocation);
        if self.failures.iter().any(|prefix| command.starts_with(prefix.as_str())) {
            return Err(ShellError::CommandFailed {
                command: command.to_string(),
                status: "exit status: 1".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

impl Shell for RecordingShell {
    fn local(&self, command: &str) -> Result<String, ShellError> {
        self.record(Invocation::Local(command.to_string()), command)?;
        Ok(String::new())
    }

    fn run(&self, command: &str) -> Result<String, ShellError> {
        self.record(Invocation::Run(command.to_string()), command)?;
        let stdout = self
            .outputs
            .iter()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, stdout)| stdout.clone())
            .unwrap_or_default();
        Ok(stdout)
    }

    fn put(&self, local_path: &Path, remote_dir: &str) -> Result<(), ShellError> {
        let invocation = Invocation::Put {
            local: local_path.to_path_buf(),
            remote_dir: remote_dir.to_string(),
        };
        self.record(invocation, &local_path.to_string_lossy())
    }
}
