//! Configuration layering
//!
//! Folds three layers into one settings object:
//! 1. Built-in defaults
//! 2. JSON config file (`--config`)
//! 3. CLI flags

mod defaults;
mod layered;
mod source;

pub use defaults::BuiltinDefaults;
pub use layered::{DeployEnv, DevEnv, EnvError, LayeredConfig};
pub use source::{ConfigOrigin, ConfigSource};
