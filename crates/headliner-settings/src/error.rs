//! Error types for loading settings.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while materializing settings from a file.
///
/// Merging itself never fails; only reading and parsing do.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file is missing or could not be read.
    #[error("Cannot read config file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file content is not well-formed JSON.
    #[error("Invalid JSON in config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed, but its top level is not an object.
    #[error("Config file {path} must contain a JSON object at the top level, found {found}")]
    NotAnObject {
        path: PathBuf,
        /// Kind of the top-level value that was found
        found: &'static str,
    },
}

impl ConfigError {
    /// Path of the file the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::FileAccess { path, .. } => path,
            Self::Parse { path, .. } => path,
            Self::NotAnObject { path, .. } => path,
        }
    }
}
