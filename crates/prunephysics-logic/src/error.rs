//! Error types for whitelist compilation and operator commands.
//!
//! Neither is fatal to the wider process: a rule that fails to compile is
//! dropped and reported, a malformed command is rejected before it touches
//! any part.

use thiserror::Error;

use crate::eligibility::Precondition;

/// A whitelist line that could not be compiled into a pattern.
#[derive(Debug, Clone, Error)]
#[error("{origin}[{line}]: invalid pattern \"{pattern}\": {source}")]
pub struct RuleError {
    /// Where the line came from (usually a file path).
    pub origin: String,
    /// 1-based line number within `origin`.
    pub line: usize,
    /// The anchored pattern text that was rejected.
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Errors raised while parsing an operator command line.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// Nothing but whitespace was given.
    #[error("empty command")]
    Empty,

    /// The first word is not a known verb.
    #[error("unknown verb \"{0}\" (expected enable or disable)")]
    UnknownVerb(String),

    /// The verb was given without a pattern.
    #[error("missing pattern after \"{0}\"")]
    MissingPattern(String),

    /// The pattern is not a valid regular expression.
    #[error("invalid pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for operator command parsing.
pub type CommandResult<T> = Result<T, CommandError>;

/// Inconsistent operator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("full significance level {0} is not a physics level (must be <= 0)")]
    FullLevelNotPhysical(i32),

    #[error("reduced significance level {0} is still a physics level (must be > 0)")]
    ReducedLevelPhysical(i32),

    #[error("precondition {0:?} listed twice")]
    DuplicatePrecondition(Precondition),
}
