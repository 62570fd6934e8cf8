//! A small interactive Unix shell.
//!
//! Lines are read by a raw-mode [`editor`] with arrow-key history recall, split
//! on whitespace by the [`tokenizer`], classified by the [`parser`] and run by the
//! [`Interpreter`]: builtins in-process, everything else as child processes found
//! on `PATH`. A line may be a pipeline (`a | b | c`), a single `&&`/`||` chain or a
//! command sent to the background with a trailing ` &`.
//!
//! The public modules expose the pieces so they can be driven without a terminal,
//! which is how the tests exercise them.

mod builtin;
pub mod command;
pub mod config;
pub mod editor;
pub mod env;
pub mod error;
pub mod external;
pub mod history;
mod interpreter;
pub mod jobs;
pub mod parser;
pub mod state;
pub mod terminal;
pub mod tokenizer;

/// The interactive command runner.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;

pub use config::ShellConfig;
pub use error::{ShellError, ShellResult};
