use crate::command::{CommandFactory, ExecutableCommand, ExitCode, Stdout};
use crate::config::ShellConfig;
use crate::editor::LineEditor;
use crate::env::Environment;
use crate::error::ShellResult;
use crate::external::{ExternalCommand, exit_code};
use crate::history::History;
use crate::jobs::JobTable;
use crate::parser::{self, AstNode, LogicalOp};
use crate::state::ShellState;
use crate::terminal::RawMode;
use crate::tokenizer::ArgVector;
use std::io::{self, IsTerminal, Write};
use std::process::{Child, ChildStdout, Stdio};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Where the next pipeline stage reads from.
enum Upstream {
    Terminal,
    Pipe(ChildStdout),
    /// Output captured from a builtin stage.
    Buffer(Vec<u8>),
    /// The previous stage could not be started.
    Closed,
}

/// An interactive shell session.
///
/// The interpreter owns the [`ShellState`] and a list of [`CommandFactory`] objects
/// that are queried for builtins before a program is looked up on `PATH`.
///
/// Example
/// ```
/// use minish::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out: Vec<u8> = Vec::new();
/// let code = sh.execute_line("echo hello | tr a-z A-Z", &mut out).unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(out, b"HELLO\n");
/// ```
pub struct Interpreter {
    state: ShellState,
    config: ShellConfig,
    commands: Vec<Box<dyn CommandFactory>>,
    editor: LineEditor,
}

impl Interpreter {
    /// Create an interpreter with a custom set of builtin factories.
    pub fn new(config: ShellConfig, commands: Vec<Box<dyn CommandFactory>>) -> ShellResult<Self> {
        config.validate()?;
        Ok(Self::build(config, commands))
    }

    /// Create an interpreter with the default builtins and the given limits.
    pub fn with_config(config: ShellConfig) -> ShellResult<Self> {
        Self::new(config, default_builtins())
    }

    fn build(config: ShellConfig, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            state: ShellState::new(&config),
            editor: LineEditor::new(config.max_line_len),
            config,
            commands,
        }
    }

    pub fn history(&self) -> &History {
        &self.state.history
    }

    pub fn jobs(&self) -> &JobTable {
        &self.state.jobs
    }

    pub fn env(&self) -> &Environment {
        &self.state.env
    }

    /// True once `exit` has run.
    pub fn should_exit(&self) -> bool {
        self.state.env.should_exit
    }

    /// Record a finalized line in the history, then run it.
    pub fn submit(&mut self, line: &str, stdout: &mut dyn Stdout) -> ShellResult<ExitCode> {
        self.state.history.append(line);
        self.state.history.reset_cursor();
        self.execute_line(line, stdout)
    }

    /// Run one command line and return the status of what ran last.
    pub fn execute_line(&mut self, line: &str, stdout: &mut dyn Stdout) -> ShellResult<ExitCode> {
        let ast = parser::construct_ast(line, &self.config)?;
        debug!(?ast, "dispatching");
        match ast {
            AstNode::Empty => Ok(0),
            AstNode::Command {
                argv,
                background,
                text,
            } => self.run_command(&argv, background, &text, stdout),
            AstNode::Pipeline(stages) => self.run_pipeline(&stages, stdout),
            AstNode::Chain { first, op, second } => {
                Ok(self.run_chain(&first, op, second.as_ref(), stdout))
            }
        }
    }

    /// Read-eval loop on the process's standard streams.
    ///
    /// Returns the status of the last command once `exit` runs or input ends.
    /// Only a failure to switch the terminal mode ends the loop with an error.
    pub fn repl(&mut self) -> ShellResult<ExitCode> {
        let mut stdout = io::stdout();
        let mut status = 0;

        while !self.state.env.should_exit {
            self.report_finished_jobs();
            let Some(line) = self.read_command()? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            status = match self.submit(&line, &mut stdout) {
                Ok(status) => status,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => settle(Err(err)),
            };
        }
        Ok(status)
    }

    fn read_command(&mut self) -> ShellResult<Option<String>> {
        let prompt = self.prompt();
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let raw_mode = if stdin.is_terminal() {
            Some(RawMode::enter(io::stdin())?)
        } else {
            None
        };
        let line = self.editor.read_line(
            &mut stdin.lock(),
            &mut stdout,
            &mut self.state.history,
            &prompt,
        );
        if let Some(raw_mode) = raw_mode {
            raw_mode.restore()?;
        }
        Ok(line?)
    }

    fn prompt(&self) -> String {
        let cwd = self.state.env.current_dir.display();
        if self.config.color {
            format!("\x1b[1;31mminish:({cwd})> \x1b[0m")
        } else {
            format!("minish:({cwd})> ")
        }
    }

    fn report_finished_jobs(&mut self) {
        for job in self.state.jobs.reap_finished() {
            println!("{job}");
        }
    }

    fn find_builtin(&self, argv: &ArgVector) -> Option<Box<dyn ExecutableCommand>> {
        let name = argv.program()?;
        self.commands
            .iter()
            .find_map(|factory| factory.try_create(name, argv.args()))
    }

    fn run_command(
        &mut self,
        argv: &ArgVector,
        background: bool,
        text: &str,
        stdout: &mut dyn Stdout,
    ) -> ShellResult<ExitCode> {
        if let Some(builtin) = self.find_builtin(argv) {
            return builtin.execute(stdout, &mut self.state);
        }

        let command = ExternalCommand::resolve(&self.state.env, argv)?;
        if background {
            let output = stdout.stdio().unwrap_or_else(Stdio::null);
            let child = command.spawn(&self.state.env, Stdio::inherit(), output)?;
            let pid = child.id();
            let number = self.state.jobs.push(child, text);
            writeln!(stdout, "[{number}] {pid}")?;
            return Ok(0);
        }

        let output = stdout.stdio().unwrap_or_else(Stdio::piped);
        let child = command.spawn(&self.state.env, Stdio::inherit(), output)?;
        wait_child(child, stdout)
    }

    /// Run `first`, then `second` only if `op` allows it given the first status.
    fn run_chain(
        &mut self,
        first: &ArgVector,
        op: LogicalOp,
        second: Option<&ArgVector>,
        stdout: &mut dyn Stdout,
    ) -> ExitCode {
        let status = settle(self.run_command(first, false, "", stdout));
        match second {
            Some(second) if op.should_continue(status) => {
                settle(self.run_command(second, false, "", stdout))
            }
            Some(_) => {
                debug!(status, ?op, "second operand skipped");
                status
            }
            None => status,
        }
    }

    /// Launch every stage at once, each reading the previous stage's output.
    ///
    /// The parent keeps no pipe ends: each read end moves into the next child's
    /// stdin and is closed in the shell as soon as that child has started. A
    /// stage that cannot be started is reported and the stage after it reads
    /// end-of-file.
    fn run_pipeline(&mut self, stages: &[ArgVector], stdout: &mut dyn Stdout) -> ShellResult<ExitCode> {
        let last = stages.len().saturating_sub(1);
        let mut upstream = Upstream::Terminal;
        let mut running: Vec<Child> = Vec::with_capacity(stages.len());
        let mut feeders: Vec<JoinHandle<io::Result<()>>> = Vec::new();
        let mut tail = None;
        let mut status = 0;

        for (i, argv) in stages.iter().enumerate() {
            let is_last = i == last;
            let input = std::mem::replace(&mut upstream, Upstream::Closed);

            if let Some(builtin) = self.find_builtin(argv) {
                drop(input);
                let result = if is_last {
                    builtin.execute(stdout, &mut self.state)
                } else {
                    let mut captured: Vec<u8> = Vec::new();
                    let result = builtin.execute(&mut captured, &mut self.state);
                    upstream = Upstream::Buffer(captured);
                    result
                };
                status = settle(result);
                continue;
            }

            let (stdin, feed) = match input {
                Upstream::Terminal => (Stdio::inherit(), None),
                Upstream::Pipe(pipe) => (Stdio::from(pipe), None),
                Upstream::Buffer(bytes) => (Stdio::piped(), Some(bytes)),
                Upstream::Closed => (Stdio::null(), None),
            };
            let output = match (is_last, stdout.stdio()) {
                (true, Some(stdio)) => stdio,
                _ => Stdio::piped(),
            };

            let spawned = ExternalCommand::resolve(&self.state.env, argv)
                .and_then(|command| command.spawn(&self.state.env, stdin, output));
            let mut child = match spawned {
                Ok(child) => child,
                Err(err) => {
                    status = settle(Err(err));
                    continue;
                }
            };

            if let (Some(bytes), Some(mut pipe)) = (feed, child.stdin.take()) {
                feeders.push(thread::spawn(move || pipe.write_all(&bytes)));
            }
            if is_last {
                tail = Some(child);
            } else {
                if let Some(pipe) = child.stdout.take() {
                    upstream = Upstream::Pipe(pipe);
                }
                running.push(child);
            }
        }

        let result = tail.map(|child| wait_child(child, stdout)).transpose();
        for mut child in running {
            if let Err(err) = child.wait() {
                warn!(pid = child.id(), "failed to wait for pipeline stage: {err}");
            }
        }
        for feeder in feeders {
            match feeder.join() {
                Ok(Err(err)) if err.kind() != io::ErrorKind::BrokenPipe => {
                    warn!("failed to feed pipeline stage: {err}")
                }
                Err(_) => warn!("pipeline feeder panicked"),
                _ => {}
            }
        }
        Ok(result?.unwrap_or(status))
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default limits and builtins:
    /// `cd`, `history`, `jobs`, `fg`, `bg`, `exit`/`quit`.
    fn default() -> Self {
        Self::build(ShellConfig::default(), default_builtins())
    }
}

fn default_builtins() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<ShowHistory>::default()),
        Box::new(Factory::<Jobs>::default()),
        Box::new(Factory::<Fg>::default()),
        Box::new(Factory::<Bg>::default()),
        Box::new(Factory::<Exit>::default()),
    ]
}

/// Copy whatever the child writes to a pipe into `stdout`, then reap it.
fn wait_child(mut child: Child, stdout: &mut dyn Stdout) -> ShellResult<ExitCode> {
    let copied = match child.stdout.take() {
        Some(mut output) => io::copy(&mut output, stdout).map(|_| ()),
        None => Ok(()),
    };
    let status = child.wait()?;
    copied?;
    Ok(exit_code(status))
}

/// Report a failed command on stderr and turn it into an exit status.
fn settle(result: ShellResult<ExitCode>) -> ExitCode {
    match result {
        Ok(status) => status,
        Err(err) => {
            eprintln!("minish: {err}");
            err.status()
        }
    }
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use crate::env::tests::lock_current_dir;
    use crate::error::ShellError;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;
    use std::time::{Duration, Instant};

    fn run(sh: &mut Interpreter, line: &str) -> (ExitCode, String) {
        let mut out: Vec<u8> = Vec::new();
        let code = sh.execute_line(line, &mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn single_command_output_is_captured() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "echo hello   world"), (0, "hello world\n".into()));
    }

    #[test]
    fn blank_line_does_nothing() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "   "), (0, String::new()));
    }

    #[test]
    fn three_stage_pipeline_moves_more_than_a_pipe_buffer() {
        let mut sh = Interpreter::default();
        let expected: String = (1..=200_000).map(|i| format!("{i}\n")).collect();
        let (code, out) = run(&mut sh, "seq 1 200000 | cat | cat");
        assert_eq!(code, 0);
        assert_eq!(out.len(), expected.len());
        assert!(out == expected);
    }

    #[test]
    fn pipeline_reports_last_stage_status() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "echo x | false").0, 1);
        assert_eq!(run(&mut sh, "false | true").0, 0);
    }

    #[test]
    fn missing_stage_does_not_stop_the_rest() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "minish-no-such-program | wc -c"), (0, "0\n".into()));
        assert_eq!(run(&mut sh, "echo x | minish-no-such-program").0, 127);
    }

    #[test]
    fn builtin_output_feeds_next_stage() {
        let mut sh = Interpreter::default();
        let mut out: Vec<u8> = Vec::new();
        sh.submit("history | tr a-z A-Z", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1: HISTORY | TR A-Z A-Z\n");
    }

    #[test]
    fn and_chain_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let mut sh = Interpreter::default();

        let line = format!("false && touch {}", marker.display());
        assert_eq!(run(&mut sh, &line).0, 1);
        assert!(!marker.exists());

        let line = format!("true && touch {}", marker.display());
        assert_eq!(run(&mut sh, &line).0, 0);
        assert!(marker.exists());
    }

    #[test]
    fn or_chain_runs_fallback_only_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let mut sh = Interpreter::default();

        let line = format!("true || touch {}", marker.display());
        assert_eq!(run(&mut sh, &line).0, 0);
        assert!(!marker.exists());

        let line = format!("false || touch {}", marker.display());
        assert_eq!(run(&mut sh, &line).0, 0);
        assert!(marker.exists());
    }

    #[test]
    fn unknown_program_counts_as_failure_in_chain() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "minish-no-such-program || echo fallback"), (0, "fallback\n".into()));
        assert_eq!(run(&mut sh, "minish-no-such-program && echo never"), (127, String::new()));
    }

    #[test]
    fn chain_operands_run_in_order() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "echo one && echo two"), (0, "one\ntwo\n".into()));
        assert_eq!(run(&mut sh, "echo alone ||"), (0, "alone\n".into()));
    }

    #[test]
    fn background_job_lifecycle() {
        let mut sh = Interpreter::default();
        let started = Instant::now();
        let (code, out) = run(&mut sh, "sleep 100 &");
        assert_eq!(code, 0);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(sh.jobs().len(), 1);

        let pid = sh.jobs().last().unwrap().pid();
        assert_eq!(out, format!("[1] {pid}\n"));
        signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM).unwrap();

        let (code, out) = run(&mut sh, "fg");
        assert_eq!(code, 128 + Signal::SIGTERM as i32);
        assert_eq!(out, "sleep 100\n");
        assert!(sh.jobs().is_empty());
    }

    #[test]
    fn cd_failure_keeps_working_directory() {
        let _lock = lock_current_dir();
        let orig = std::env::current_dir().unwrap();
        let mut sh = Interpreter::default();
        let err = sh
            .execute_line("cd /minish/does/not/exist", &mut Vec::<u8>::new())
            .unwrap_err();
        assert!(matches!(err, ShellError::DirectoryChangeFailure { .. }));
        assert_eq!(std::env::current_dir().unwrap(), orig);
        assert_eq!(sh.env().current_dir, orig);
    }

    #[test]
    fn too_many_arguments_is_reported() {
        let config = ShellConfig {
            max_args: 2,
            ..ShellConfig::default()
        };
        let mut sh = Interpreter::with_config(config).unwrap();
        let err = sh.execute_line("echo a b", &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, ShellError::TooManyArguments { limit: 2 }));
    }

    #[test]
    fn submit_records_history_once() {
        let mut sh = Interpreter::default();
        sh.submit("true", &mut Vec::<u8>::new()).unwrap();
        sh.submit("minish-no-such-program", &mut Vec::<u8>::new()).unwrap_err();
        let lines: Vec<&str> = sh.history().iter().collect();
        assert_eq!(lines, vec!["true", "minish-no-such-program"]);
        assert_eq!(sh.history().position(), None);
    }

    #[test]
    fn exit_stops_the_session() {
        let mut sh = Interpreter::default();
        assert_eq!(run(&mut sh, "exit 7").0, 7);
        assert!(sh.should_exit());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ShellConfig {
            max_pipe_stages: 0,
            ..ShellConfig::default()
        };
        assert!(matches!(
            Interpreter::with_config(config),
            Err(ShellError::InvalidConfig(_))
        ));
    }
}
