//! Layered configuration
//!
//! Built-in defaults, then the JSON config file, then CLI flags, each
//! folded into one settings object with `update`.

use headliner_settings::{read_config_file_with_bytes, ConfigError, SettingsObj};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::defaults::BuiltinDefaults;
use super::source::ConfigSource;

/// Settings for the remote deploy tasks, read from the `deploy` attribute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployEnv {
    pub path: String,
    pub user: String,
    pub hosts: Vec<String>,
    pub num_keep_releases: u32,
    pub use_ssh_config: bool,
    pub connect_timeout_seconds: u32,
    pub git_ref: String,
    pub setup_command: String,
    pub restart_command: String,
}

/// Settings for the local development tasks, read from the `dev` attribute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevEnv {
    pub nose_config: String,
    pub flake_config: String,
}

/// Errors building the layered configuration
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid `{section}` settings: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// The merged settings plus the layers that produced them
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub settings: SettingsObj,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl LayeredConfig {
    /// Build the configuration from defaults, an optional file and CLI overrides
    pub fn build(
        config_path: Option<&Path>,
        cli_overrides: Option<SettingsObj>,
    ) -> Result<Self, EnvError> {
        let mut settings = BuiltinDefaults::default().to_settings();
        let mut sources = vec![ConfigSource::builtin()];

        if let Some(path) = config_path {
            let (file_settings, bytes) = read_config_file_with_bytes(path)?;
            let source = ConfigSource::file(path, &bytes);
            info!(
                path = %path.display(),
                digest = source.digest.as_deref().unwrap_or_default(),
                "applying config file"
            );
            settings.update(file_settings);
            sources.push(source);
        }

        if let Some(overrides) = cli_overrides.filter(|o| !o.is_empty()) {
            settings.update(overrides);
            sources.push(ConfigSource::cli());
        }

        Ok(Self { settings, sources })
    }

    pub fn deploy_env(&self) -> Result<DeployEnv, EnvError> {
        self.section("deploy")
    }

    pub fn dev_env(&self) -> Result<DevEnv, EnvError> {
        self.section("dev")
    }

    fn section<T: DeserializeOwned>(&self, section: &'static str) -> Result<T, EnvError> {
        serde_json::from_value(self.settings[section].clone())
            .map_err(|source| EnvError::InvalidSection { section, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigOrigin;
    use headliner_settings::settings;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_with_defaults_only() {
        let config = LayeredConfig::build(None, None).unwrap();
        let env = config.deploy_env().unwrap();

        assert_eq!(env.path, "/var/www/headliner");
        assert_eq!(env.num_keep_releases, 10);
        assert!(env.hosts.is_empty());
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_file_merges_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.json");
        fs::write(
            &path,
            r#"{"deploy": {"hosts": ["web1"], "num_keep_releases": 3}, "app": {"debug": true}}"#,
        )
        .unwrap();

        let config = LayeredConfig::build(Some(path.as_path()), None).unwrap();
        let env = config.deploy_env().unwrap();

        assert_eq!(env.hosts, vec!["web1".to_string()]);
        assert_eq!(env.num_keep_releases, 3);
        // untouched defaults survive the merge
        assert_eq!(env.user, "headliner");
        assert_eq!(config.settings.get_bool("app.debug"), Some(true));
        assert_eq!(config.sources[1].origin, ConfigOrigin::File);
        assert!(config.sources[1].digest.is_some());
    }

    #[test]
    fn test_digest_matches_loaded_bytes() {
        use sha2::{Digest, Sha256};

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.json");
        let content = r#"{"deploy": {"user": "digest-user"}}"#;
        fs::write(&path, content).unwrap();

        let config = LayeredConfig::build(Some(path.as_path()), None).unwrap();

        let expected = hex::encode(Sha256::digest(content.as_bytes()));
        assert_eq!(config.sources[1].digest.as_deref(), Some(expected.as_str()));
        assert_eq!(config.deploy_env().unwrap().user, "digest-user");
    }

    #[test]
    fn test_cli_overrides_win() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.json");
        fs::write(&path, r#"{"deploy": {"user": "file-user", "path": "/srv/file"}}"#).unwrap();

        let overrides = settings! { deploy: {"user": "cli-user"} };
        let config = LayeredConfig::build(Some(path.as_path()), Some(overrides)).unwrap();
        let env = config.deploy_env().unwrap();

        assert_eq!(env.user, "cli-user");
        assert_eq!(env.path, "/srv/file");
        assert_eq!(config.sources.last().unwrap().origin, ConfigOrigin::Cli);
    }

    #[test]
    fn test_empty_overrides_are_not_recorded() {
        let config = LayeredConfig::build(None, Some(SettingsObj::new())).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_missing_file_propagates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.json");

        let err = LayeredConfig::build(Some(path.as_path()), None).unwrap_err();

        assert!(matches!(err, EnvError::Config(ConfigError::FileAccess { .. })));
    }

    #[test]
    fn test_replaced_section_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deploy.json");
        fs::write(&path, r#"{"deploy": "nope"}"#).unwrap();

        let config = LayeredConfig::build(Some(path.as_path()), None).unwrap();
        let err = config.deploy_env().unwrap_err();

        assert!(matches!(err, EnvError::InvalidSection { section: "deploy", .. }));
        // the dev section is unaffected
        assert_eq!(config.dev_env().unwrap().nose_config, "nose.cfg");
    }
}
