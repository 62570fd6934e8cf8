use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::error::{ShellError, ShellResult};
use crate::interpreter::Factory;
use crate::state::ShellState;
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd" or "jobs".
    fn name() -> &'static str;

    /// Other names the command answers to.
    fn aliases() -> &'static [&'static str] {
        &[]
    }

    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(self: Box<Self>, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        T::execute(*self, stdout, state)
    }
}

/// Outcome of `argh` declining to build a command: `--help` text or a usage error.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(self: Box<Self>, stdout: &mut dyn Stdout, _state: &mut ShellState) -> ShellResult<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 2 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[String]) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() && !T::aliases().iter().any(|alias| *alias == name) {
            return None;
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Some(match T::from_args(&[name], &args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        let target = match self.target.filter(|t| !t.is_empty()) {
            Some(t) => PathBuf::from(t),
            None => state
                .env
                .get_var("HOME")
                .map(PathBuf::from)
                .ok_or(ShellError::MissingArgument("cd"))?,
        };
        state.env.change_dir(&target)?;
        debug!(cwd = %state.env.current_dir.display(), "changed directory");
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the command lines entered in this session, oldest first.
pub struct ShowHistory {}

impl BuiltinCommand for ShowHistory {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        for (i, line) in state.history.iter().enumerate() {
            writeln!(stdout, "{}: {}", i + 1, line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List background jobs that are still running.
pub struct Jobs {}

impl BuiltinCommand for Jobs {
    fn name() -> &'static str {
        "jobs"
    }

    fn execute(self, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        for job in state.jobs.reap_finished() {
            writeln!(stdout, "{job}")?;
        }
        if state.jobs.is_empty() {
            writeln!(stdout, "No background jobs")?;
            return Ok(0);
        }
        for (i, job) in state.jobs.iter().enumerate() {
            writeln!(stdout, "[{}] {} {}", i + 1, job.pid(), job.command())?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Continue the most recent background job and wait for it to finish.
pub struct Fg {}

impl BuiltinCommand for Fg {
    fn name() -> &'static str {
        "fg"
    }

    fn execute(self, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        let job = state.jobs.last().ok_or(ShellError::NoBackgroundJob("fg"))?;
        writeln!(stdout, "{}", job.command())?;
        stdout.flush()?;
        job.resume()?;

        match state.jobs.pop_last() {
            Some(job) => job.wait(),
            None => Err(ShellError::NoBackgroundJob("fg")),
        }
    }
}

#[derive(FromArgs)]
/// Continue the most recent background job without waiting for it.
pub struct Bg {}

impl BuiltinCommand for Bg {
    fn name() -> &'static str {
        "bg"
    }

    fn execute(self, stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        let job = state.jobs.last().ok_or(ShellError::NoBackgroundJob("bg"))?;
        job.resume()?;
        writeln!(stdout, "[{}] {} &", state.jobs.len(), job.command())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, default = "0")]
    /// status to exit with.
    pub code: ExitCode,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn aliases() -> &'static [&'static str] {
        &["quit"]
    }

    fn execute(self, _stdout: &mut dyn Stdout, state: &mut ShellState) -> ShellResult<ExitCode> {
        state.env.should_exit = true;
        Ok(self.code)
    }
}
