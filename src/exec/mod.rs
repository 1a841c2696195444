// ABOUTME: External tool execution for docker, kubectl and git.
// ABOUTME: Exports the CommandRunner seam, its process-backed runner, and errors.

mod error;
mod runner;

pub use error::{ExecError, ExecErrorKind};
pub use runner::{CommandOutput, CommandRunner, Invocation, SystemRunner};
