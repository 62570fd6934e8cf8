use crate::error::{ShellError, ShellResult};
use std::collections::HashMap;
use std::env as stdenv;
use std::fs;
use std::path::{Path, PathBuf};

/// Process environment seen by the commands the shell launches.
///
/// - `vars`: variables passed to every external program.
/// - `current_dir`: working directory of launched programs, kept in sync with the
///   shell's own working directory by [`Environment::change_dir`].
/// - `should_exit`: set by `exit`; the interactive loop stops once it is true.
#[derive(Debug, Clone)]
pub struct Environment {
    pub vars: HashMap<String, String>,
    pub current_dir: PathBuf,
    pub should_exit: bool,
}

impl Environment {
    /// Snapshot the variables and working directory of the running process.
    pub fn capture() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            vars,
            current_dir,
            should_exit: false,
        }
    }

    /// Looks up `self.vars` first, falling back to the process environment.
    pub fn get_var(&self, key: &str) -> Option<String> {
        self.vars
            .get(key)
            .cloned()
            .or_else(|| stdenv::var(key).ok())
    }

    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// Change the working directory of the shell process.
    ///
    /// Relative targets are resolved against `current_dir`. On failure nothing
    /// changes.
    pub fn change_dir(&mut self, target: &Path) -> ShellResult<()> {
        let failure = |source| ShellError::DirectoryChangeFailure {
            target: target.display().to_string(),
            source,
        };

        let new_dir = if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.current_dir.join(target)
        };
        let canonical = fs::canonicalize(&new_dir).map_err(failure)?;
        stdenv::set_current_dir(&canonical).map_err(failure)?;
        self.current_dir = canonical;
        Ok(())
    }
}
