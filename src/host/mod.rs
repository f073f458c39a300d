//! Host-side command execution
//!
//! Local commands, remote commands over SSH, and file upload, behind
//! the [`Shell`] trait so task sequences can be recorded in tests.

pub mod shell;

pub use shell::{Invocation, RecordingShell, Shell, ShellError, SshConfig, SshShell};
