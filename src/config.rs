//! Limits and cosmetic switches shared by all shell components.

use crate::error::{ShellError, ShellResult};

/// Size of the line buffer in bytes, including the slot for the terminator.
pub const MAX_CMD_LENGTH: usize = 1024;
/// Maximum number of tokens in one argument vector.
pub const MAX_ARGS: usize = 100;
/// Maximum number of stages in one pipeline.
pub const MAX_PIPE_CMDS: usize = 10;
/// Number of command lines retained by the history store.
pub const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Line buffer size; the editor accepts at most `max_line_len - 1` bytes.
    pub max_line_len: usize,
    pub max_args: usize,
    pub max_pipe_stages: usize,
    pub max_history: usize,
    /// Print the prompt in bold red.
    pub color: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            max_line_len: MAX_CMD_LENGTH,
            max_args: MAX_ARGS,
            max_pipe_stages: MAX_PIPE_CMDS,
            max_history: MAX_HISTORY,
            color: true,
        }
    }
}

impl ShellConfig {
    /// Reject limits that would make a component unusable.
    pub fn validate(&self) -> ShellResult<()> {
        let limits = [
            ("max_line_len", self.max_line_len < 2),
            ("max_args", self.max_args == 0),
            ("max_pipe_stages", self.max_pipe_stages == 0),
            ("max_history", self.max_history == 0),
        ];
        match limits.iter().find(|(_, bad)| *bad) {
            Some((name, _)) => Err(ShellError::InvalidConfig(format!("{name} is too small"))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_history, 50);
        assert_eq!(config.max_pipe_stages, 10);
    }

    #[test]
    fn zero_history_is_rejected() {
        let config = ShellConfig {
            max_history: 0,
            ..ShellConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_history"));
    }
}
