//! Error taxonomy shared by every compilation stage.
//!
//! Three variants are fatal and abort a run (`RuleSyntaxError`, `IoError`, `OverflowError`);
//! `AmbiguityWarning` is not part of [GenError] at all since it never aborts anything — it is
//! reported at the point of tagging and optionally collected by the caller (see
//! [crate::driver::compile]).

use std::path::PathBuf;

use thiserror::Error;

/// Any failure that can abort a generator run.
#[derive(Debug, Error)]
pub enum GenError {
    #[error(transparent)]
    Rule(#[from] RuleSyntaxError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Overflow(#[from] OverflowError),
}

/// A malformed rule line: missing name, missing pattern, unterminated escape, unmatched
/// bracket/paren, a postfix operator with nothing to repeat, or a code point out of range.
#[derive(Debug, Error)]
#[error("{line}:{col}: {message}")]
pub struct RuleSyntaxError {
    pub line: usize,
    pub col: usize,
    pub message: String,
}

impl RuleSyntaxError {
    pub fn new(line: usize, col: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            col,
            message: message.into(),
        }
    }
}

/// Could not open the rules file, create the output directory, or write/flush an output file.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct IoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// More than `u16::MAX` NFA/DFA states, or more than `u32::MAX` alphabet indices.
#[derive(Debug, Error)]
#[error("{what} overflowed its {limit}-bit index space (count reached {count})")]
pub struct OverflowError {
    pub what: &'static str,
    pub limit: u32,
    pub count: u64,
}

impl OverflowError {
    pub fn states(count: u64) -> Self {
        Self {
            what: "state count",
            limit: 16,
            count,
        }
    }

    pub fn alphabet(count: u64) -> Self {
        Self {
            what: "alphabet size",
            limit: 32,
            count,
        }
    }
}

/// Two rules accept the same prefix at the same DFA state; the earlier-declared rule wins.
/// Non-fatal — reported via `eprintln!` at the point of tagging (see [crate::dfa::tag]) and
/// returned alongside the compiled DFA so callers don't have to scrape stderr to assert on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbiguityWarning {
    pub state: u32,
    pub winner: std::rc::Rc<str>,
    pub shadowed: std::rc::Rc<str>,
}

impl std::fmt::Display for AmbiguityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rule `{}` shadowed by rule `{}` at state {}",
            self.shadowed, self.winner, self.state
        )
    }
}
