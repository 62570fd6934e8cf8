//! Error taxonomy of the shell.
//!
//! Every per-command failure is recoverable: the interactive loop reports it and
//! moves on to the next prompt. Only losing control of the terminal mode is fatal.

use nix::errno::Errno;
use std::io;
use thiserror::Error;

/// Result alias used across the crate.
pub type ShellResult<T> = Result<T, ShellError>;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("too many arguments (limit is {limit})")]
    TooManyArguments { limit: usize },

    #[error("too many pipeline stages (limit is {limit})")]
    TooManyStages { limit: usize },

    #[error("syntax error near unexpected '{0}'")]
    UnexpectedToken(&'static str),

    #[error("only one '&&' or '||' per command line is supported")]
    UnsupportedChain,

    #[error("{0}: command not found")]
    ProgramNotFound(String),

    #[error("{program}: {source}")]
    ExecFailure {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cd: {target}: {source}")]
    DirectoryChangeFailure {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),

    #[error("{0}: no background job")]
    NoBackgroundJob(&'static str),

    #[error("failed to signal process {pid}: {source}")]
    SignalFailure {
        pid: u32,
        #[source]
        source: Errno,
    },

    #[error("cannot change terminal mode: {0}")]
    TerminalModeFailure(#[source] Errno),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ShellError {
    /// Whether the interactive loop must stop after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShellError::TerminalModeFailure(_))
    }

    /// Exit status a command line gets when it fails with this error.
    pub fn status(&self) -> i32 {
        match self {
            ShellError::ProgramNotFound(_) => 127,
            ShellError::ExecFailure { .. } => 126,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_terminal_failures_are_fatal() {
        assert!(ShellError::TerminalModeFailure(Errno::ENOTTY).is_fatal());
        assert!(!ShellError::NoBackgroundJob("fg").is_fatal());
        assert!(!ShellError::ProgramNotFound("nope".into()).is_fatal());
    }

    #[test]
    fn failure_statuses_follow_shell_conventions() {
        assert_eq!(ShellError::ProgramNotFound("nope".into()).status(), 127);
        let exec = ShellError::ExecFailure {
            program: "x".into(),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert_eq!(exec.status(), 126);
        assert_eq!(ShellError::UnsupportedChain.status(), 1);
    }

    #[test]
    fn messages_name_the_offender() {
        let err = ShellError::ProgramNotFound("frobnicate".into());
        assert_eq!(err.to_string(), "frobnicate: command not found");

        let err = ShellError::TooManyArguments { limit: 100 };
        assert_eq!(err.to_string(), "too many arguments (limit is 100)");
    }
}
