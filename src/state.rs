use crate::config::ShellConfig;
use crate::env::Environment;
use crate::history::History;
use crate::jobs::JobTable;

/// Everything a shell session mutates between prompts.
///
/// Created once at startup and owned by the [`Interpreter`](crate::Interpreter);
/// built-ins receive it by mutable reference.
#[derive(Debug)]
pub struct ShellState {
    pub env: Environment,
    pub history: History,
    pub jobs: JobTable,
}

impl ShellState {
    pub fn new(config: &ShellConfig) -> Self {
        Self {
            env: Environment::capture(),
            history: History::new(config.max_history),
            jobs: JobTable::new(),
        }
    }
}
