//! Evaluation errors.

use crate::tree::SourcePos;
use core::error::Error;
use core::fmt;

/// What went wrong during evaluation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// No mixin of this name is visible from the call site.
    UndefinedMixin { name: String },
    /// Candidates exist but none accepts the arguments and guards.
    NoMatchingGuard { name: String },
    UndefinedVariable { name: String },
    /// Extension cycle. Recovered by the extend pass and never returned.
    CircularExtend,
    /// An operator or function was applied to values it does not support.
    InvalidOperationType { message: String },
    ImportResolutionFailure { path: String, message: String },
    /// Mixin or detached-ruleset calls nested deeper than the configured limit.
    CallDepthExceeded { limit: usize },
}

/// An evaluation failure at a source position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalError {
    pub kind: ErrorKind,
    pub pos: SourcePos,
}

impl EvalError {
    #[inline]
    pub const fn new(kind: ErrorKind, pos: SourcePos) -> Self {
        Self { kind, pos }
    }

    pub fn undefined_mixin(name: &str, pos: SourcePos) -> Self {
        Self::new(
            ErrorKind::UndefinedMixin {
                name: name.to_owned(),
            },
            pos,
        )
    }

    pub fn no_matching_guard(name: &str, pos: SourcePos) -> Self {
        Self::new(
            ErrorKind::NoMatchingGuard {
                name: name.to_owned(),
            },
            pos,
        )
    }

    pub fn undefined_variable(name: &str, pos: SourcePos) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable {
                name: name.to_owned(),
            },
            pos,
        )
    }

    pub fn invalid_operation(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(
            ErrorKind::InvalidOperationType {
                message: message.into(),
            },
            pos,
        )
    }

    pub fn import_failure(path: &str, message: impl Into<String>, pos: SourcePos) -> Self {
        Self::new(
            ErrorKind::ImportResolutionFailure {
                path: path.to_owned(),
                message: message.into(),
            },
            pos,
        )
    }

    pub const fn call_depth_exceeded(limit: usize, pos: SourcePos) -> Self {
        Self::new(ErrorKind::CallDepthExceeded { limit }, pos)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedMixin { name } => write!(formatter, "undefined mixin '{name}'"),
            Self::NoMatchingGuard { name } => {
                write!(formatter, "no matching definition for mixin '{name}'")
            }
            Self::UndefinedVariable { name } => write!(formatter, "variable '@{name}' is undefined"),
            Self::CircularExtend => formatter.write_str("circular extend"),
            Self::InvalidOperationType { message } => formatter.write_str(message),
            Self::ImportResolutionFailure { path, message } => {
                write!(formatter, "cannot import '{path}': {message}")
            }
            Self::CallDepthExceeded { limit } => {
                write!(formatter, "call depth exceeded the limit of {limit}")
            }
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} at {}", self.kind, self.pos)
    }
}

impl Error for EvalError {}
