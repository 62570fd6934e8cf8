use crate::error::ShellResult;
use crate::state::ShellState;
use std::io::Write;
use std::process::Stdio;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Processes killed by a signal report `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// Destination for the output of a command line.
///
/// Built-ins write to it directly. External programs are connected to it through
/// [`Stdout::stdio`]: a stream backed by a real descriptor hands that descriptor to
/// the child, anything else returns `None` and the shell pipes the child's output
/// back and copies it in.
pub trait Stdout: Write {
    fn stdio(&self) -> Option<Stdio>;
}

impl Stdout for std::io::Stdout {
    fn stdio(&self) -> Option<Stdio> {
        Some(Stdio::inherit())
    }
}

impl Stdout for Vec<u8> {
    fn stdio(&self) -> Option<Stdio> {
        None
    }
}

/// Object-safe trait for a command the shell runs in-process.
pub trait ExecutableCommand {
    fn execute(self: Box<Self>, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>>;
}
