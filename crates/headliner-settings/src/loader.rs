//! Loading settings from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::settings::SettingsObj;

/// Anything that names the config file to load.
///
/// Argument parsing lives upstream; the loader only needs the resolved path.
pub trait ConfigOptions {
    /// Path of the JSON config file
    fn config(&self) -> &Path;
}

/// Minimal options carrying only the config path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub config: PathBuf,
}

impl Options {
    pub fn new(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
        }
    }
}

impl ConfigOptions for Options {
    fn config(&self) -> &Path {
        &self.config
    }
}

impl ConfigOptions for Path {
    fn config(&self) -> &Path {
        self
    }
}

impl ConfigOptions for PathBuf {
    fn config(&self) -> &Path {
        self
    }
}

impl<T: ConfigOptions + ?Sized> ConfigOptions for &T {
    fn config(&self) -> &Path {
        (**self).config()
    }
}

/// Read the JSON file named by `options` into a new [`SettingsObj`].
///
/// Each top-level key of the document becomes an attribute, set directly.
/// A missing or unreadable file and malformed JSON are both reported;
/// neither yields an empty object.
pub fn read_config_file<O: ConfigOptions + ?Sized>(options: &O) -> Result<SettingsObj, ConfigError> {
    read_config_file_with_bytes(options).map(|(settings, _)| settings)
}

/// Like [`read_config_file`], also returning the exact bytes that were parsed.
///
/// The file is read once; callers that hash or record the content get
/// the same bytes the settings came from.
pub fn read_config_file_with_bytes<O: ConfigOptions + ?Sized>(
    options: &O,
) -> Result<(SettingsObj, Vec<u8>), ConfigError> {
    let path = options.config();
    debug!(path = %path.display(), "reading config file");

    let bytes = fs::read(path).map_err(|source| ConfigError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;

    let settings = parse_config(path, &bytes)?;

    info!(
        path = %path.display(),
        attributes = settings.len(),
        "loaded config file"
    );

    Ok((settings, bytes))
}

/// Parse already-read JSON into a [`SettingsObj`].
///
/// `path` is only used to label errors.
pub fn parse_config(path: &Path, bytes: &[u8]) -> Result<SettingsObj, ConfigError> {
    let document: Value = serde_json::from_slice(bytes).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match document {
        Value::Object(attributes) => Ok(SettingsObj::from(attributes)),
        other => Err(ConfigError::NotAnObject {
            path: path.to_path_buf(),
            found: value_kind(&other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        write!(temp, "{}", content).unwrap();
        temp
    }

    #[test]
    fn test_reads_config_from_file() {
        let temp = write_temp(r#"{"foo": {"bar": "baz"}}"#);
        let options = Options::new(temp.path());

        let config = read_config_file(&options).unwrap();

        assert_eq!(config["foo"]["bar"], "baz");
    }

    #[test]
    fn test_accepts_plain_path() {
        let temp = write_temp(r#"{"answer": 42}"#);

        let config = read_config_file(temp.path()).unwrap();

        assert_eq!(config["answer"], 42);
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let err = read_config_file(&Options::new(&path)).unwrap_err();

        assert!(matches!(err, ConfigError::FileAccess { .. }));
        assert_eq!(err.path(), &path);
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let temp = write_temp(r#"{"foo": "#);

        let err = read_config_file(temp.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_top_level_array_is_rejected() {
        let temp = write_temp("[1, 2, 3]");

        let err = read_config_file(temp.path()).unwrap_err();

        assert!(matches!(err, ConfigError::NotAnObject { found: "an array", .. }));
    }

    #[test]
    fn test_returns_the_parsed_bytes() {
        let content = r#"{"foo": {"bar": "baz"}}"#;
        let temp = write_temp(content);

        let (config, bytes) = read_config_file_with_bytes(temp.path()).unwrap();

        assert_eq!(bytes, content.as_bytes());
        assert_eq!(config["foo"]["bar"], "baz");
    }

    #[test]
    fn test_parse_config_labels_errors_with_path() {
        let err = parse_config(Path::new("inline.json"), b"\"just a string\"").unwrap_err();

        assert!(matches!(err, ConfigError::NotAnObject { found: "a string", .. }));
        assert_eq!(err.path(), Path::new("inline.json"));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = parse_config(Path::new("bad.json"), &[0xff, 0xfe]).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_empty_object_gives_empty_settings() {
        let temp = write_temp("{}");

        let config = read_config_file(temp.path()).unwrap();

        assert!(config.is_empty());
    }
}
