//! The command node: declaration, registration and switch inheritance.
//!
//! A [`Command`] owns its arguments, options, flags and children. Its
//! `extends` list points at shared [`Command`] templates whose switches are
//! inherited and whose actions run, in order, before its own.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, LazyLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::Regex;

use crate::args::{CommandArgs, PipeResult};
use crate::argument::Argument;
use crate::error::{ActionError, Result};
use crate::flag::{BUILTIN_FLAG_ORDER, Flag, FlagOptions};
use crate::option::CliOption;

/// Canonical name of the implicit help flag.
pub const HELP_FLAG: &str = "help";
/// Canonical name of the implicit version flag.
pub const VERSION_FLAG: &str = "version";
/// Flag that switches action error reporting to full traces.
pub const DEBUG_FLAG: &str = "cli-debug";

/// Base display-order offset for switches inherited through `extends`.
pub const EXTENDS_ORDER_OFFSET: i32 = 50;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(.*?)>").expect("static regex must compile"));

/// Handler run for a command once argv has been parsed.
pub type Action = Arc<
    dyn Fn(CommandArgs) -> BoxFuture<'static, std::result::Result<PipeResult, ActionError>>
        + Send
        + Sync,
>;

/// Mutator applied to the shared input before an extended command runs.
pub type OverrideArgs = Arc<dyn Fn(&mut CommandArgs) + Send + Sync>;

/// One entry of a command's `extends` list.
#[derive(Clone)]
pub struct Extension {
    command: Arc<Command>,
    override_args: Option<OverrideArgs>,
}

impl Extension {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub(crate) fn apply_override(&self, input: &mut CommandArgs) {
        if let Some(override_args) = &self.override_args {
            override_args(input);
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("command", &self.command.name)
            .field("override_args", &self.override_args.is_some())
            .finish()
    }
}

/// How a child is registered on a parent.
///
/// ```
/// use command_pipe_core::{Command, Subcommand};
///
/// let mut root = Command::new("tool").unwrap();
/// root.command("init <dir>").unwrap();
/// root.command(Command::new("clean").unwrap()).unwrap();
///
/// let names: Vec<_> = root.children().iter().map(|c| c.name()).collect();
/// assert_eq!(names, ["init", "clean"]);
/// assert!(matches!(Subcommand::from("x"), Subcommand::Declare(_)));
/// ```
#[derive(Debug, Clone)]
pub enum Subcommand {
    /// Build a new child from a declaration such as `"deploy <env>"`.
    Declare(String),
    /// Adopt an already-built command.
    Attach(Command),
}

impl From<&str> for Subcommand {
    fn from(declaration: &str) -> Self {
        Self::Declare(declaration.to_string())
    }
}

impl From<String> for Subcommand {
    fn from(declaration: String) -> Self {
        Self::Declare(declaration)
    }
}

impl From<Command> for Subcommand {
    fn from(command: Command) -> Self {
        Self::Attach(command)
    }
}

impl From<Arc<Command>> for Subcommand {
    fn from(command: Arc<Command>) -> Self {
        Self::Attach(Arc::unwrap_or_clone(command))
    }
}

/// A node of the command tree.
///
/// # Examples
///
/// ```
/// use command_pipe_core::{CliOption, Command, Flag};
///
/// let build = Command::new("build <args?...>")
///     .unwrap()
///     .with_description("Build the definitions")
///     .with_option(CliOption::new("-s, --source").unwrap().with_default("./"))
///     .with_flag(Flag::new("--no-cache").unwrap());
///
/// assert_eq!(build.name(), "build");
/// assert_eq!(build.arguments()[0].name(), "args");
/// // help and version are always present
/// assert_eq!(build.flags().len(), 3);
/// ```
#[derive(Clone)]
pub struct Command {
    name: String,
    version: Option<String>,
    usage: Option<String>,
    description: Option<String>,
    arguments: Vec<Argument>,
    options: Vec<CliOption>,
    flags: Vec<Flag>,
    children: Vec<Command>,
    action: Option<Action>,
    extends: Vec<Extension>,
    order: i32,
    strict: bool,
}

impl Command {
    /// Creates a command from its declaration.
    ///
    /// The bare name is everything before the first space. Every `<...>`
    /// placeholder in the declaration becomes an [`Argument`], left to right.
    ///
    /// # Errors
    ///
    /// Fails when a placeholder is not a valid argument declaration.
    pub fn new(declaration: &str) -> Result<Self> {
        let name = declaration.split(' ').next().unwrap_or_default().to_string();
        let arguments = PLACEHOLDER
            .captures_iter(declaration)
            .map(|caps| Argument::new(&caps[1]))
            .collect::<Result<Vec<_>>>()?;

        let flags = vec![
            Flag::with_options(
                "-h, --help",
                FlagOptions {
                    desc: Some("output usage information".to_string()),
                    order: Some(BUILTIN_FLAG_ORDER),
                },
            )?,
            Flag::with_options(
                "-V, --version",
                FlagOptions {
                    desc: Some("output the version number".to_string()),
                    order: Some(BUILTIN_FLAG_ORDER),
                },
            )?,
        ];

        Ok(Self {
            name,
            version: None,
            usage: None,
            description: None,
            arguments,
            options: Vec::new(),
            flags,
            children: Vec::new(),
            action: None,
            extends: Vec::new(),
            order: 0,
            strict: true,
        })
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Replaces the generated usage suffix.
    pub fn with_usage(mut self, usage: &str) -> Self {
        self.usage = Some(usage.to_string());
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    /// Sort key among siblings in help listings.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// `false` makes unknown switches silently ignored.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Adds an option after the ones already declared.
    pub fn with_option(mut self, option: CliOption) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a flag after the ones already declared.
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Registers a child and returns `self`.
    pub fn with_command(mut self, child: impl Into<Subcommand>) -> Result<Self> {
        self.command(child)?;
        Ok(self)
    }

    /// Registers a child and returns it for further inspection.
    pub fn command(&mut self, child: impl Into<Subcommand>) -> Result<&mut Command> {
        let child = match child.into() {
            Subcommand::Declare(declaration) => Command::new(&declaration)?,
            Subcommand::Attach(command) => command,
        };
        self.children.push(child);
        let last = self.children.len() - 1;
        Ok(&mut self.children[last])
    }

    /// Sets an asynchronous action.
    ///
    /// The value the action resolves with is merged into the pipe result of
    /// any command that extends this one.
    ///
    /// The action receives its own copy of the input, so edits it makes to
    /// `args`, `options` or `flags` are not seen by later stages. Hand data
    /// forward through the resolved value, or rewrite the shared input with
    /// [`Command::extends_with`].
    pub fn with_action<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn(CommandArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<PipeResult, ActionError>> + Send + 'static,
    {
        let action: Action = Arc::new(move |input: CommandArgs| action(input).boxed());
        self.action = Some(action);
        self
    }

    /// Sets an action that completes synchronously.
    pub fn with_sync_action<F>(self, action: F) -> Self
    where
        F: Fn(CommandArgs) -> std::result::Result<PipeResult, ActionError> + Send + Sync + 'static,
    {
        self.with_action(move |input| std::future::ready(action(input)))
    }

    /// Layers `command` in front of this one.
    pub fn extends(self, command: impl Into<Arc<Command>>) -> Self {
        self.push_extension(command.into(), None)
    }

    /// Layers `command` in front of this one, rewriting the shared input first.
    pub fn extends_with<F>(self, command: impl Into<Arc<Command>>, override_args: F) -> Self
    where
        F: Fn(&mut CommandArgs) + Send + Sync + 'static,
    {
        self.push_extension(command.into(), Some(Arc::new(override_args)))
    }

    fn push_extension(mut self, command: Arc<Command>, override_args: Option<OverrideArgs>) -> Self {
        self.extends.push(Extension {
            command,
            override_args,
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own version, without ancestor fallback.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn children(&self) -> &[Command] {
        &self.children
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extends
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Own options merged with everything inherited through `extends`.
    pub fn options(&self) -> Vec<CliOption> {
        unranked(merge_extended(self))
    }

    /// Own flags merged with everything inherited through `extends`.
    pub fn flags(&self) -> Vec<Flag> {
        unranked(merge_extended(self))
    }

    /// Finds an option by switch text (leading dashes removed).
    ///
    /// Local options are consulted first, then each extension in declaration
    /// order.
    pub fn find_option(&self, switch: &str) -> Option<CliOption> {
        lookup(merge_extended(self), switch)
    }

    /// Finds a flag by switch text (leading dashes removed), with the same
    /// precedence as [`Command::find_option`].
    pub fn find_flag(&self, switch: &str) -> Option<Flag> {
        lookup(merge_extended(self), switch)
    }

    /// Child whose bare name matches `name`, ignoring case.
    pub fn find_child(&self, name: &str) -> Option<&Command> {
        self.children.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("options", &self.options)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .field("action", &self.action.is_some())
            .field("extends", &self.extends)
            .field("order", &self.order)
            .field("strict", &self.strict)
            .finish()
    }
}

/// Switch types that take part in the `extends` merge.
pub(crate) trait Inherited: Clone {
    fn declared(command: &Command) -> &[Self];
    fn collides_with(&self, other: &Self) -> bool;
    fn matches_switch(&self, switch: &str) -> bool;
    fn shift_order(&mut self, delta: i32);
}

impl Inherited for Flag {
    fn declared(command: &Command) -> &[Self] {
        &command.flags
    }

    fn matches_switch(&self, switch: &str) -> bool {
        self.matches(switch)
    }

    fn collides_with(&self, other: &Self) -> bool {
        self.shares_name(other)
    }

    fn shift_order(&mut self, delta: i32) {
        self.offset_order(delta);
    }
}

impl Inherited for CliOption {
    fn declared(command: &Command) -> &[Self] {
        &command.options
    }

    fn matches_switch(&self, switch: &str) -> bool {
        self.matches(switch)
    }

    fn collides_with(&self, other: &Self) -> bool {
        self.shares_name(other)
    }

    fn shift_order(&mut self, delta: i32) {
        self.offset_order(delta);
    }
}

/// A merged switch with the extends path it came through.
///
/// `path` is empty for local items and `[i + 1, ...]` for items inherited via
/// the `i`-th extension, so lexicographic order is lookup precedence.
struct Ranked<T> {
    path: Vec<usize>,
    item: T,
}

/// Folds each extension's switches in front of the accumulated list.
///
/// Inherited items are order-shifted by `50 + index` and dropped when their
/// name is already taken by an item of the accumulator. Local items win over
/// inherited ones, and an earlier extension wins over a later one.
fn merge_extended<T: Inherited>(command: &Command) -> Vec<Ranked<T>> {
    let mut merged: Vec<Ranked<T>> = T::declared(command)
        .iter()
        .cloned()
        .map(|item| Ranked {
            path: Vec::new(),
            item,
        })
        .collect();
    for (index, extension) in command.extends.iter().enumerate() {
        let delta = i32::try_from(index)
            .unwrap_or(i32::MAX)
            .saturating_add(EXTENDS_ORDER_OFFSET);
        let mut surviving: Vec<Ranked<T>> = merge_extended::<T>(&extension.command)
            .into_iter()
            .map(|mut ranked| {
                ranked.item.shift_order(delta);
                ranked.path.insert(0, index + 1);
                ranked
            })
            .filter(|ranked| !merged.iter().any(|m| m.item.collides_with(&ranked.item)))
            .collect();
        surviving.extend(merged);
        merged = surviving;
    }
    merged
}

fn unranked<T>(merged: Vec<Ranked<T>>) -> Vec<T> {
    merged.into_iter().map(|ranked| ranked.item).collect()
}

/// Highest-precedence item answering to `switch`; ties keep declaration order.
fn lookup<T: Inherited>(merged: Vec<Ranked<T>>, switch: &str) -> Option<T> {
    merged
        .into_iter()
        .filter(|ranked| ranked.item.matches_switch(switch))
        .min_by(|a, b| a.path.cmp(&b.path))
        .map(|ranked| ranked.item)
}
