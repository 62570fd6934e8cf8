use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::{ShellError, ShellResult};
use crate::tokenizer::ArgVector;
use std::borrow::Cow;
use std::ffi::OsStr;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, ExitStatus, Stdio};
use tracing::debug;

/// A program found on disk, ready to be launched as a child process.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    name: String,
    path: PathBuf,
    args: Vec<String>,
}

impl ExternalCommand {
    /// Locate the program named by `argv` using the `PATH` of `env`.
    pub fn resolve(env: &Environment, argv: &ArgVector) -> ShellResult<Self> {
        let name = argv.program().unwrap_or_default();
        let search_paths = env.get_var("PATH").unwrap_or_default();
        let path = find_command_path(OsStr::new(&search_paths), Path::new(name))
            .ok_or_else(|| ShellError::ProgramNotFound(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            path: path.into_owned(),
            args: argv.args().to_vec(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Start the program without waiting for it.
    ///
    /// The child sees the name it was invoked by as `argv[0]`, inherits the
    /// variables of `env` and runs in `env.current_dir`.
    pub fn spawn(&self, env: &Environment, stdin: Stdio, stdout: Stdio) -> ShellResult<Child> {
        let child = std::process::Command::new(&self.path)
            .arg0(&self.name)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir)
            .spawn()
            .map_err(|source| ShellError::ExecFailure {
                program: self.name.clone(),
                source,
            })?;
        debug!(pid = child.id(), program = %self.path.display(), "spawned");
        Ok(child)
    }
}

/// Exit code of a finished child, `128 + signal` when it was killed.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => 128 + signal,
        (None, None) => -1,
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it exists.
/// - `./`-prefixed path: returns it if it exists.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it exists.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first existing match.
/// - Empty path: returns `None`.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, _) => None,
        (Some(single), None) => find_in_path(search_paths, single.as_os_str()).map(Cow::Owned),
        _ => find_by_path(path).map(Cow::Borrowed),
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .map(|dir| dir.join(cmd))
        .find(|candidate| candidate.is_file())
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if path.exists() { Some(path) } else { None }
}
