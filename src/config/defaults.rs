//! Built-in defaults (lowest configuration layer)

use headliner_settings::SettingsObj;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Remote directory holding every release (default: "/var/www/headliner")
    pub path: String,

    /// Remote login user (default: "headliner")
    pub user: String,

    /// Number of release directories to keep on the host (default: 10)
    pub num_keep_releases: u32,

    /// Honour the user's ~/.ssh/config (default: true)
    pub use_ssh_config: bool,

    /// SSH connection timeout in seconds (default: 30)
    pub connect_timeout_seconds: u32,

    /// Git ref archived for upload (default: "master")
    pub git_ref: String,

    /// Run inside the new release directory to build its environment
    pub setup_command: String,

    /// Restarts the running service after the symlink swap
    pub restart_command: String,

    /// nosetests config file (default: "nose.cfg")
    pub nose_config: String,

    /// flake8 config file (default: "flake8.cfg")
    pub flake_config: String,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            path: "/var/www/headliner".to_string(),
            user: "headliner".to_string(),
            num_keep_releases: 10,
            use_ssh_config: true,
            connect_timeout_seconds: 30,
            git_ref: "master".to_string(),
            setup_command: "MOZ_UPHEADLINER_PROD=1 ./setup-project.sh".to_string(),
            restart_command: "sudo supervisorctl restart headliner:*".to_string(),
            nose_config: "nose.cfg".to_string(),
            flake_config: "flake8.cfg".to_string(),
        }
    }
}

impl BuiltinDefaults {
    /// Convert to a settings object, ready to be layered under file and CLI values
    pub fn to_settings(&self) -> SettingsObj {
        SettingsObj::with_values([
            (
                "deploy",
                json!({
                    "path": self.path,
                    "user": self.user,
                    "hosts": [],
                    "num_keep_releases": self.num_keep_releases,
                    "use_ssh_config": self.use_ssh_config,
                    "connect_timeout_seconds": self.connect_timeout_seconds,
                    "git_ref": self.git_ref,
                    "setup_command": self.setup_command,
                    "restart_command": self.restart_command,
                }),
            ),
            (
                "dev",
                json!({
                    "nose_config": self.nose_config,
                    "flake_config": self.flake_config,
                }),
            ),
        ])
    }
}
