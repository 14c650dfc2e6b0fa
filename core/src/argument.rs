//! Positional argument slots.

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, Result};

/// Explicit settings for an [`Argument`] declared outside a command name.
///
/// Markers in the declaration string (`?`, `...`) apply on top of these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentOptions {
    /// The slot may be left empty.
    pub optional: bool,
    /// The slot consumes every remaining positional value.
    pub rest: bool,
}

/// One positional parameter slot of a command.
///
/// Parsed from a declaration where a trailing `...` marks a rest argument and
/// a trailing `?` marks an optional one. Both markers are stripped from the
/// stored name.
///
/// # Examples
///
/// ```
/// use command_pipe_core::Argument;
///
/// let files = Argument::new("files?...").unwrap();
/// assert_eq!(files.name(), "files");
/// assert!(!files.required());
/// assert!(files.rest());
///
/// let target = Argument::new("target").unwrap();
/// assert!(target.required());
/// assert!(!target.rest());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    name: String,
    required: bool,
    rest: bool,
}

impl Argument {
    /// Creates an argument from its declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidArgumentName`] when nothing is left
    /// of the declaration after its markers are removed.
    pub fn new(declaration: &str) -> Result<Self> {
        Self::with_options(declaration, ArgumentOptions::default())
    }

    /// Creates an argument with explicit settings.
    pub fn with_options(declaration: &str, options: ArgumentOptions) -> Result<Self> {
        let mut name = declaration.trim();
        let mut required = !options.optional;
        let mut rest = options.rest;

        if let Some(stripped) = name.strip_suffix("...") {
            rest = true;
            name = stripped;
        }
        if let Some(stripped) = name.strip_suffix('?') {
            required = false;
            name = stripped;
        }
        if name.is_empty() {
            return Err(ConstructionError::InvalidArgumentName(
                declaration.to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            required,
            rest,
        })
    }

    /// Name with markers removed.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn rest(&self) -> bool {
        self.rest
    }

    /// Placeholder shown in usage lines, e.g. `<args?...>`.
    pub fn placeholder(&self) -> String {
        format!(
            "<{}{}{}>",
            self.name,
            if self.required { "" } else { "?" },
            if self.rest { "..." } else { "" }
        )
    }
}
