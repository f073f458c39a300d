//! Local development tasks: tests, lint and packaging.

use super::{section, TaskError};
use crate::config::DevEnv;
use crate::host::Shell;

/// A string that is not a recognised truth value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid truth value {0:?}")]
pub struct InvalidBool(pub String);

/// Parse a truth value.
///
/// `y`, `yes`, `t`, `true`, `on` and `1` are true; `n`, `no`, `f`,
/// `false`, `off` and `0` are false. Case is ignored.
pub fn to_bool(value: &str) -> Result<bool, InvalidBool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(InvalidBool(value.to_string())),
    }
}

pub struct DevTasks<'a, S: Shell> {
    shell: &'a S,
    env: &'a DevEnv,
}

impl<'a, S: Shell> DevTasks<'a, S> {
    pub fn new(shell: &'a S, env: &'a DevEnv) -> Self {
        Self { shell, env }
    }

    /// Run the automated tests.
    ///
    /// `debug_errors` drops into the debugger when an exception escapes a
    /// test, `debug_failures` when an assertion fails.
    pub fn test(
        &self,
        config: Option<&str>,
        debug_errors: bool,
        debug_failures: bool,
    ) -> Result<(), TaskError> {
        let config = config.unwrap_or(self.env.nose_config.as_str());
        let mut command = format!("nosetests --config={}", config);
        if debug_errors {
            command.push_str(" --ipdb");
        }
        if debug_failures {
            command.push_str(" --ipdb-failures");
        }
        section("test", || self.shell.local(&command).map(|_| ()))
    }

    pub fn flake(&self, config: Option<&str>) -> Result<(), TaskError> {
        let config = config.unwrap_or(self.env.flake_config.as_str());
        section("flake", || {
            self.shell
                .local(&format!("flake8 . --config={}", config))
                .map(|_| ())
        })
    }

    pub fn package(&self, clean: bool) -> Result<(), TaskError> {
        section("package", || {
            if clean {
                self.shell.local("rm -rf build/")?;
            }
            self.shell.local("python setup.py build").map(|_| ())
        })
    }

    /// Test, lint and package with default options
    pub fn build(&self) -> Result<(), TaskError> {
        self.test(None, false, false)?;
        self.flake(None)?;
        self.package(true)
    }
}
