//! Deploy and development tasks
//!
//! Every task is an ordered list of shell commands. Tasks run as named
//! sections; the first failing command aborts the section.

pub mod deploy;
pub mod dev;

pub use deploy::Deployer;
pub use dev::{to_bool, DevTasks, InvalidBool};

use tracing::{info, info_span};

use crate::host::ShellError;

/// Task errors
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("Section \"{section}\" failed: {source}")]
    Shell {
        section: &'static str,
        #[source]
        source: ShellError,
    },
}

/// Run `body` as the named section.
pub(crate) fn section<T>(
    name: &'static str,
    body: impl FnOnce() -> Result<T, ShellError>,
) -> Result<T, TaskError> {
    composite(name, || {
        body().map_err(|source| TaskError::Shell { section: name, source })
    })
}

/// Run `body`, itself made of sections, as the named section.
///
/// Inner sections nest under this one; their errors pass through as-is,
/// so a failure names the innermost section.
pub(crate) fn composite<T>(
    name: &'static str,
    body: impl FnOnce() -> Result<T, TaskError>,
) -> Result<T, TaskError> {
    let _span = info_span!("section", name).entered();
    info!("Running section \"{}\"", name);
    body()
}
