//! Remote release deployment
//!
//! Archive the repository, upload and unpack it as a new release,
//! prune old releases, swap the `current`/`previous` symlinks and
//! restart the service.

use std::path::Path;

use tracing::info;

use super::{composite, section, TaskError};
use crate::config::DeployEnv;
use crate::host::Shell;
use crate::release::{releases_to_prune, Release};

/// Deploy tasks for one host and one release
pub struct Deployer<'a, S: Shell> {
    shell: &'a S,
    env: &'a DeployEnv,
    release: Release,
}

impl<'a, S: Shell> Deployer<'a, S> {
    pub fn new(shell: &'a S, env: &'a DeployEnv, release: Release) -> Self {
        Self { shell, env, release }
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Create the releases directory and deploy cold
    pub fn setup(&self) -> Result<(), TaskError> {
        composite("setup", || {
            self.shell
                .run(&format!("mkdir -p {}", self.env.path))
                .map_err(|source| TaskError::Shell {
                    section: "setup",
                    source,
                })?;
            self.deploy_cold()
        })
    }

    /// Deploy code without changing the running version
    pub fn deploy_cold(&self) -> Result<(), TaskError> {
        composite("deploy_cold", || {
            self.upload_from_git()?;
            self.setup_virtualenv()
        })
    }

    /// Deploy code, prune old releases, set symlinks and restart
    pub fn deploy(&self) -> Result<(), TaskError> {
        composite("deploy", || {
            self.deploy_cold()?;
            self.clean_release_dir()?;
            self.set_symlinks()?;
            self.restart_processes()?;
            info!(release = %self.release, "deployed");
            Ok(())
        })
    }

    /// Create a tarball, send it over the wire and untar it
    pub fn upload_from_git(&self) -> Result<(), TaskError> {
        let archive = self.release.archive_name();
        let release_dir = self.release.dir(&self.env.path);

        section("upload_from_git", || {
            self.shell.local(&format!(
                "git archive --format=tar {} | bzip2 > {}",
                self.env.git_ref, archive
            ))?;
            self.shell.put(Path::new(&archive), "/tmp/")?;

            self.shell.run(&format!("mkdir {}", release_dir))?;
            self.shell
                .run(&format!("cd {} && tar xjf /tmp/{}", release_dir, archive))?;
            self.shell.run(&format!("rm /tmp/{}", archive))?;

            self.shell.local(&format!("rm {}", archive))?;
            Ok(())
        })
    }

    /// Point `current` at this release, keeping the old one as `previous`
    pub fn set_symlinks(&self) -> Result<(), TaskError> {
        let path = &self.env.path;

        section("set_symlinks", || {
            self.shell.run(&format!(
                "if [ -h {path}/previous ]; then rm {path}/previous; fi"
            ))?;
            self.shell.run(&format!(
                "if [ -h {path}/current ]; then mv {path}/current {path}/previous; fi"
            ))?;
            self.shell
                .run(&format!("ln -s {} {path}/current", self.release.dir(path)))?;
            Ok(())
        })
    }

    /// Build the release's environment on the host
    pub fn setup_virtualenv(&self) -> Result<(), TaskError> {
        section("setup_virtualenv", || {
            self.shell
                .run(&format!(
                    "cd {} && {}",
                    self.release.dir(&self.env.path),
                    self.env.setup_command
                ))
                .map(|_| ())
        })
    }

    /// Delete the oldest releases beyond `num_keep_releases`
    pub fn clean_release_dir(&self) -> Result<(), TaskError> {
        section("clean_release_dir", || {
            if self.env.num_keep_releases <= 1 {
                return Ok(());
            }
            let listing = self.shell.run(&format!(
                "find {} -maxdepth 1 -mindepth 1 -type d | sort",
                self.env.path
            ))?;
            let stale = releases_to_prune(&listing, self.env.num_keep_releases);
            if stale.is_empty() {
                return Ok(());
            }
            info!(count = stale.len(), "removing old releases");
            self.shell.run(&format!("rm -rf {}", stale.join(" ")))?;
            Ok(())
        })
    }

    pub fn restart_processes(&self) -> Result<(), TaskError> {
        section("restart_processes", || {
            self.shell.run(&self.env.restart_command).map(|_| ())
        })
    }
}
