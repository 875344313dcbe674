use std::io;

use thiserror::Error;

use crate::ruleset::RuleSource;

/// The reason a pattern could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("patterns cannot start with '#'")]
    Comment,

    #[error("patterns cannot contain null bytes")]
    NullByte,

    #[error("pattern has no path components")]
    NoComponents,

    #[error("unterminated character class in `{0}`")]
    UnterminatedClass(String),

    #[error("invalid character range `{start}-{end}`")]
    InvalidRange { start: char, end: char },

    #[error("trailing backslash in `{0}`")]
    TrailingBackslash(String),

    #[error("failed to compile glob `{glob}`: {message}")]
    Regex { glob: String, message: String },
}

/// A rule whose pattern failed to compile. Carries the location of the rule
/// so the offending line can be reported precisely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{rule_source}: invalid pattern `{pattern}`: {reason}")]
pub struct MalformedPatternError {
    pub rule_source: RuleSource,
    pub pattern: String,
    #[source]
    pub reason: PatternError,
}

/// Errors returned when loading rules from disk.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    MalformedPattern(#[from] MalformedPatternError),

    #[error("failed to read ownership file: {0}")]
    Io(#[from] io::Error),
}
