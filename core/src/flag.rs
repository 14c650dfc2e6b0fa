//! Boolean switches and the declaration grammar shared with options.
//!
//! A declaration is a comma-separated list such as `"-s, --source <dir>"`.
//! Tokens starting with `--` are long names, tokens starting with a single `-`
//! are short aliases. Text after the first space of the last token is kept as
//! the usage placeholder.

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, Result};

/// Display order of a flag built without explicit config.
pub const DEFAULT_FLAG_ORDER: i32 = 1000;

/// Display order of the implicit `help` and `version` flags.
pub const BUILTIN_FLAG_ORDER: i32 = 2000;

/// Explicit config for a [`Flag`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOptions {
    /// Help text.
    pub desc: Option<String>,
    /// Display order; defaults to [`DEFAULT_FLAG_ORDER`].
    pub order: Option<i32>,
}

/// A named boolean switch.
///
/// # Examples
///
/// ```
/// use command_pipe_core::Flag;
///
/// let flag = Flag::new("-n, --no-cache").unwrap();
/// assert_eq!(flag.name(), "no-cache");
/// assert_eq!(flag.alias(), ["n"]);
/// assert!(flag.matches("NO-CACHE"));
/// assert!(flag.matches("n"));
///
/// assert!(Flag::new("verbose").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    names: Vec<String>,
    alias: Vec<String>,
    desc: Option<String>,
    usage: Option<String>,
    order: i32,
}

impl Flag {
    /// Parses a declaration with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::InvalidFlagName`] for a token without a
    /// dash prefix and [`ConstructionError::EmptyFlagDeclaration`] when no
    /// token names the flag.
    pub fn new(declaration: &str) -> Result<Self> {
        let (names, alias, usage) = parse_declaration(declaration)?;
        Ok(Self {
            names,
            alias,
            desc: None,
            usage,
            order: DEFAULT_FLAG_ORDER,
        })
    }

    /// Parses a declaration and applies explicit config.
    pub fn with_options(declaration: &str, options: FlagOptions) -> Result<Self> {
        let mut flag = Self::new(declaration)?;
        flag.desc = options.desc;
        flag.order = options.order.unwrap_or(DEFAULT_FLAG_ORDER);
        Ok(flag)
    }

    /// Sets the help text.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.desc = Some(desc.to_string());
        self
    }

    /// Sets the display order.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Long names, without the `--` prefix.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Short aliases, without the `-` prefix.
    pub fn alias(&self) -> &[String] {
        &self.alias
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Value placeholder text, e.g. `<dir>`.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    /// Canonical key: first long name, falling back to the first alias.
    pub fn name(&self) -> &str {
        self.names
            .first()
            .or_else(|| self.alias.first())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Whether a switch (leading dashes already removed) selects this flag.
    ///
    /// Long names compare case-insensitively, aliases exactly.
    pub fn matches(&self, switch: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(switch))
            || self.alias.iter().any(|a| a == switch)
    }

    /// Whether `other` would collide with this flag in a merged list.
    pub(crate) fn shares_name(&self, other: &Flag) -> bool {
        self.names.iter().any(|n| other.names.contains(n)) || self.name() == other.name()
    }

    pub(crate) fn offset_order(&mut self, delta: i32) {
        self.order = self.order.saturating_add(delta);
    }
}

fn parse_declaration(declaration: &str) -> Result<(Vec<String>, Vec<String>, Option<String>)> {
    let mut tokens: Vec<&str> = declaration.trim().split(',').collect();
    let mut usage = None;

    if let Some(last) = tokens.last_mut() {
        let trimmed = last.trim();
        let (head, tail) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
        let tail = tail.trim();
        if !tail.is_empty() {
            usage = Some(tail.to_string());
        }
        *last = head;
    }

    let mut names = Vec::new();
    let mut alias = Vec::new();
    for token in tokens.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let (bucket, bare) = if let Some(bare) = token.strip_prefix("--") {
            (&mut names, bare)
        } else if let Some(bare) = token.strip_prefix('-') {
            (&mut alias, bare)
        } else {
            return Err(ConstructionError::InvalidFlagName(token.to_string()));
        };
        if bare.is_empty() {
            return Err(ConstructionError::InvalidFlagName(token.to_string()));
        }
        bucket.push(bare.to_string());
    }

    if names.is_empty() && alias.is_empty() {
        return Err(ConstructionError::EmptyFlagDeclaration(
            declaration.to_string(),
        ));
    }

    Ok((names, alias, usage))
}
