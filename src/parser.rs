//! Classification of a finalized command line.
//!
//! Precedence follows the dispatch order of the shell:
//! 1. a single `|` anywhere makes the line a pipeline, whatever else it holds;
//! 2. otherwise a `&&` or `||` makes it a two-operand logical chain;
//! 3. otherwise it is a simple command, detached when it ends in ` &`.

use crate::config::ShellConfig;
use crate::error::{ShellError, ShellResult};
use crate::tokenizer::{ArgVector, tokenize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// `&&`: run the second operand only after a zero exit status.
    And,
    /// `||`: run the second operand only after a non-zero exit status.
    Or,
}

impl LogicalOp {
    pub fn should_continue(self, first_status: i32) -> bool {
        match self {
            LogicalOp::And => first_status == 0,
            LogicalOp::Or => first_status != 0,
        }
    }

    fn token(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    /// Nothing to run, e.g. a lone `&`.
    Empty,
    Command {
        argv: ArgVector,
        background: bool,
        /// Command text as shown by `jobs` and `fg`.
        text: String,
    },
    /// Stages connected by `|`, at least two.
    Pipeline(Vec<ArgVector>),
    Chain {
        first: ArgVector,
        op: LogicalOp,
        second: Option<ArgVector>,
    },
}

/// Classify and tokenize `line`.
pub fn construct_ast(line: &str, config: &ShellConfig) -> ShellResult<AstNode> {
    if has_pipe(line) {
        return parse_pipeline(line, config);
    }
    if let Some((idx, op)) = find_logical_op(line) {
        return parse_chain(line, idx, op, config);
    }
    parse_command(line, config)
}

/// A `|` that is not part of `||`.
fn has_pipe(line: &str) -> bool {
    line.replace("||", "").contains('|')
}

fn find_logical_op(line: &str) -> Option<(usize, LogicalOp)> {
    let and = line.find("&&").map(|i| (i, LogicalOp::And));
    let or = line.find("||").map(|i| (i, LogicalOp::Or));
    match (and, or) {
        (Some(a), Some(o)) => Some(if a.0 < o.0 { a } else { o }),
        (a, o) => a.or(o),
    }
}

/// Split on every `|`. The two bars of a `||` separate stages like a single one.
fn parse_pipeline(line: &str, config: &ShellConfig) -> ShellResult<AstNode> {
    let segments: Vec<&str> = line
        .split("||")
        .flat_map(|run| run.split('|'))
        .collect();
    if segments.len() > config.max_pipe_stages {
        return Err(ShellError::TooManyStages {
            limit: config.max_pipe_stages,
        });
    }

    let mut stages = Vec::with_capacity(segments.len());
    for segment in segments {
        let argv = tokenize(segment, config.max_args)?;
        if argv.is_empty() {
            return Err(ShellError::UnexpectedToken("|"));
        }
        stages.push(argv);
    }
    Ok(AstNode::Pipeline(stages))
}

fn parse_chain(line: &str, idx: usize, op: LogicalOp, config: &ShellConfig) -> ShellResult<AstNode> {
    let (head, rest) = (&line[..idx], &line[idx + 2..]);
    if find_logical_op(rest).is_some() {
        return Err(ShellError::UnsupportedChain);
    }

    let first = tokenize(head, config.max_args)?;
    if first.is_empty() {
        return Err(ShellError::UnexpectedToken(op.token()));
    }
    let second = tokenize(rest, config.max_args)?;
    Ok(AstNode::Chain {
        first,
        op,
        second: (!second.is_empty()).then_some(second),
    })
}

fn parse_command(line: &str, config: &ShellConfig) -> ShellResult<AstNode> {
    let (text, background) = strip_background_marker(line);
    let argv = tokenize(text, config.max_args)?;
    if argv.is_empty() {
        return Ok(AstNode::Empty);
    }
    Ok(AstNode::Command {
        argv,
        background,
        text: text.trim().to_string(),
    })
}

/// Detect and remove a trailing `&` preceded by whitespace.
fn strip_background_marker(line: &str) -> (&str, bool) {
    let trimmed = line.trim_end_matches([' ', '\t', '\n']);
    match trimmed.strip_suffix('&') {
        Some(head) if head.is_empty() || head.ends_with([' ', '\t', '\n']) => (head, true),
        _ => (line, false),
    }
}
