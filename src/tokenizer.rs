//! Whitespace tokenization of command lines.
//!
//! There is no quoting, escaping or expansion: a token is a maximal run of
//! characters other than space, tab and newline.

use crate::error::{ShellError, ShellResult};

/// Owned argument vector of one command.
///
/// The program name is the first element. The vector owns its tokens, so it
/// stays valid after the line it was cut from has been reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgVector(Vec<String>);

impl ArgVector {
    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Arguments after the program name.
    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n')
}

/// Split `line` into at most `max_args` tokens.
pub fn tokenize(line: &str, max_args: usize) -> ShellResult<ArgVector> {
    let mut tokens = Vec::new();
    for token in line.split(is_delimiter).filter(|t| !t.is_empty()) {
        if tokens.len() == max_args {
            return Err(ShellError::TooManyArguments { limit: max_args });
        }
        tokens.push(token.to_string());
    }
    Ok(ArgVector(tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        let argv = tokenize("  ls   -la  ", 10).unwrap();
        assert_eq!(argv.as_slice(), ["ls", "-la"]);
        assert_eq!(argv.program(), Some("ls"));
        assert_eq!(argv.args(), ["-la"]);
    }

    #[test]
    fn blank_line_yields_empty_vector() {
        let argv = tokenize(" \t \n ", 10).unwrap();
        assert!(argv.is_empty());
        assert_eq!(argv.program(), None);
        assert!(argv.args().is_empty());
    }

    #[test]
    fn tabs_and_newlines_separate_tokens() {
        let argv = tokenize("grep\tfoo\nbar.txt", 10).unwrap();
        assert_eq!(argv.as_slice(), ["grep", "foo", "bar.txt"]);
    }

    #[test]
    fn quotes_are_not_special() {
        let argv = tokenize("echo \"a b\"", 10).unwrap();
        assert_eq!(argv.as_slice(), ["echo", "\"a", "b\""]);
    }

    #[test]
    fn argument_limit_is_enforced() {
        assert_eq!(tokenize("a b c", 3).unwrap().len(), 3);
        match tokenize("a b c d", 3) {
            Err(ShellError::TooManyArguments { limit }) => assert_eq!(limit, 3),
            other => panic!("expected TooManyArguments, got {:?}", other),
        }
    }
}
