//! Bookkeeping for detached (background) processes.

use crate::command::ExitCode;
use crate::error::{ShellError, ShellResult};
use crate::external::exit_code;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::fmt;
use std::process::Child;
use tracing::{debug, warn};

/// A process launched with a trailing `&`.
#[derive(Debug)]
pub struct Job {
    command: String,
    child: Child,
}

impl Job {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Send `SIGCONT` so a stopped job runs again.
    pub fn resume(&self) -> ShellResult<()> {
        let pid = self.pid();
        signal::kill(Pid::from_raw(pid as i32), Signal::SIGCONT)
            .map_err(|source| ShellError::SignalFailure { pid, source })?;
        debug!(pid, "sent SIGCONT");
        Ok(())
    }

    /// Block until the process terminates.
    pub fn wait(mut self) -> ShellResult<ExitCode> {
        let status = self.child.wait()?;
        Ok(exit_code(status))
    }
}

/// A job that was found to have terminated by [`JobTable::reap_finished`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedJob {
    /// 1-based position the job had in the table.
    pub number: usize,
    pub pid: u32,
    pub command: String,
    pub status: ExitCode,
}

impl fmt::Display for FinishedJob {
    /// Completion notice in the form `[n]+ Done cmd`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            0 => write!(f, "[{}]+ Done {}", self.number, self.command),
            code => write!(f, "[{}]+ Exit {} {}", self.number, code, self.command),
        }
    }
}

/// Background jobs in launch order; the last one is the current job.
#[derive(Debug, Default)]
pub struct JobTable {
    jobs: Vec<Job>,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `child` and return its 1-based job number.
    pub fn push(&mut self, child: Child, command: impl Into<String>) -> usize {
        let job = Job {
            command: command.into(),
            child,
        };
        debug!(pid = job.pid(), command = job.command(), "job added");
        self.jobs.push(job);
        self.jobs.len()
    }

    pub fn last(&self) -> Option<&Job> {
        self.jobs.last()
    }

    pub fn pop_last(&mut self) -> Option<Job> {
        let job = self.jobs.pop();
        if let Some(job) = &job {
            debug!(pid = job.pid(), "job removed");
        }
        job
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Collect every job whose process has exited, without blocking.
    pub fn reap_finished(&mut self) -> Vec<FinishedJob> {
        let mut finished = Vec::new();
        let mut number = 0;
        self.jobs.retain_mut(|job| {
            number += 1;
            let status = match job.child.try_wait() {
                Ok(Some(status)) => exit_code(status),
                Ok(None) => return true,
                Err(err) => {
                    warn!(pid = job.child.id(), "cannot poll background job: {err}");
                    return true;
                }
            };
            debug!(pid = job.child.id(), status, "job finished");
            finished.push(FinishedJob {
                number,
                pid: job.child.id(),
                command: job.command.clone(),
                status,
            });
            false
        });
        finished
    }
}
