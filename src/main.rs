//! minish entry point.
//!
//! Usage:
//!   minish                     # interactive session
//!   minish -c <command>        # run one command line and exit

use anyhow::{Context, Result};
use argh::FromArgs;
use minish::{Interpreter, ShellConfig};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(FromArgs)]
/// A small interactive shell with pipelines, `&&`/`||` and background jobs.
struct Args {
    /// run a single command line instead of starting a session.
    #[argh(option, short = 'c')]
    command: Option<String>,

    /// number of command lines kept in the history.
    #[argh(option, default = "minish::config::MAX_HISTORY")]
    history_size: usize,

    /// print the prompt without ANSI colors.
    #[argh(switch)]
    no_color: bool,
}

fn main() -> ExitCode {
    // RUST_LOG overrides the default of warnings only
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Args = argh::from_env();
    match run(args) {
        Ok(status) => ExitCode::from(status as u8),
        Err(e) => {
            eprintln!("minish: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<i32> {
    let config = ShellConfig {
        max_history: args.history_size,
        color: !args.no_color,
        ..ShellConfig::default()
    };
    let mut shell = Interpreter::with_config(config).context("invalid shell configuration")?;

    match args.command {
        Some(line) => match shell.execute_line(&line, &mut std::io::stdout()) {
            Ok(status) => Ok(status),
            Err(err) => {
                eprintln!("minish: {err}");
                Ok(err.status())
            }
        },
        None => shell.repl().context("interactive session failed"),
    }
}
