//! Headliner deploy tool
//!
//! Ships releases of the headliner service to its hosts and runs the
//! project's development tasks. Configuration is a layered
//! [`SettingsObj`](headliner_settings::SettingsObj): built-in defaults,
//! then a JSON file, then command-line flags, deep-merged in that order.

pub mod config;
pub mod host;
pub mod release;
pub mod tasks;

pub use config::{DeployEnv, DevEnv, EnvError, LayeredConfig};
pub use host::{RecordingShell, Shell, ShellError, SshConfig, SshShell};
pub use release::Release;
pub use tasks::{Deployer, DevTasks, TaskError};
