//! Error types for declaration, argv parsing and action execution.
//!
//! The three enums map onto the three failure phases of an invocation:
//! building the command tree, parsing argv against it, and running actions.

use std::error::Error as StdError;
use std::fmt::Write as _;

use thiserror::Error;

/// Malformed flag, option or argument declaration.
///
/// Raised while the command tree is built; a tree that fails here never
/// reaches argv parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A comma-separated declaration token has neither a `-` nor a `--` prefix,
    /// or has nothing after its prefix.
    #[error("invalid flag name: {0}")]
    InvalidFlagName(String),
    /// The declaration contained no names at all.
    #[error("flag declaration has no names: {0:?}")]
    EmptyFlagDeclaration(String),
    /// An argument declaration is empty once its markers are stripped.
    #[error("invalid argument name: {0:?}")]
    InvalidArgumentName(String),
}

/// Convenience alias for declaration results.
pub type Result<T> = std::result::Result<T, ConstructionError>;

/// Failure loading package metadata for a program root.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The manifest file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The manifest is not valid JSON for [`PackageMetadata`](crate::PackageMetadata).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Argv that does not fit the command it was routed to.
///
/// Usage errors never reach an action. They render help for the command being
/// parsed and end the invocation with exit status 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    /// A required positional argument has no value.
    #[error("missing required argument: {0}")]
    MissingArgument(String),
    /// More positional values than declared arguments, and the last argument is not rest.
    #[error("too many arguments: expected at most {expected}, got {actual}")]
    TooManyArguments { expected: usize, actual: usize },
    /// An option switch was the last token or was followed by an empty token.
    #[error("missing value for option: {0}")]
    MissingOptionValue(String),
    /// A switch matched neither an option nor a flag under strict mode.
    #[error("unknown option: {0}")]
    UnknownSwitch(String),
    /// Nothing to route to and no action to run.
    #[error("no action registered")]
    NoAction,
}

/// Failure reported by an action or by one of the extensions in front of it.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Plain message failure.
    #[error("{0}")]
    Message(String),
    /// Failure carrying an underlying error.
    #[error(transparent)]
    Source(Box<dyn StdError + Send + Sync + 'static>),
    /// The action panicked while running.
    #[error("action panicked: {0}")]
    Panicked(String),
    /// I/O performed by the action failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON handling inside the action failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ActionError {
    /// Creates a message-only error.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_pipe_core::ActionError;
    ///
    /// let err = ActionError::msg("upload failed");
    /// assert_eq!(err.to_string(), "upload failed");
    /// ```
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps any error type.
    pub fn new(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(err))
    }

    /// Renders the error followed by every `source()` in its chain.
    ///
    /// Used for `--cli-debug` reporting.
    pub fn trace(&self) -> String {
        let mut out = format!("{self}");
        let mut source = match self {
            // Transparent variants already display the boxed error itself.
            Self::Source(inner) => inner.source(),
            _ => StdError::source(self),
        };
        while let Some(err) = source {
            let _ = write!(out, "\n  caused by: {err}");
            source = err.source();
        }
        let _ = write!(out, "\n\n{self:#?}");
        out
    }
}
