//! Headliner settings
//!
//! An attribute-style settings object whose `update` folds nested
//! mappings into each other recursively, plus a loader that fills one
//! from a JSON file.
//!
//! ```
//! use headliner_settings::{settings, Value};
//!
//! let mut obj = settings! { foo: {"bar": {"baz1": "baz1"}} };
//! obj.update(settings! { foo: {"bar": {"baz2": "baz2"}} });
//!
//! assert_eq!(obj["foo"]["bar"]["baz1"], "baz1");
//! assert_eq!(obj["foo"]["bar"]["baz2"], "baz2");
//! assert!(matches!(obj["foo"], Value::Object(_)));
//! ```

mod error;
mod loader;
mod merge;
mod settings;

pub use error::ConfigError;
pub use loader::{
    parse_config, read_config_file, read_config_file_with_bytes, ConfigOptions, Options,
};
pub use merge::merge;
pub use serde_json::{Map, Value};
pub use settings::SettingsObj;

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
