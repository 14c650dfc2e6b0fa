//! Usage, help and version text.
//!
//! Rendering is pure; [`Command::show_help`] and friends print the text and
//! terminate the process.

use crate::command::Command;
use crate::flag::Flag;

const SWITCH_COLUMN: usize = 31;
const COMMAND_COLUMN: usize = 41;

/// Position of a command in the tree being dispatched.
///
/// Carries what a command would otherwise read from its parent: the names of
/// its ancestors and the nearest declared version.
///
/// # Examples
///
/// ```
/// use command_pipe_core::{Command, Scope};
///
/// let root = Command::new("tool").unwrap().with_version("1.2.0");
/// let deploy = Command::new("deploy <env>").unwrap();
///
/// let scope = Scope::of(&root).enter(&deploy);
/// assert_eq!(scope.full_name(), "tool deploy");
/// assert_eq!(scope.version(), Some("1.2.0"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    path: Vec<String>,
    version: Option<String>,
}

impl Scope {
    /// Scope of a root command.
    pub fn of(command: &Command) -> Self {
        Self::default().enter(command)
    }

    /// Scope of `command` when reached from this one.
    pub fn enter(&self, command: &Command) -> Self {
        let mut path = self.path.clone();
        if !command.name().is_empty() {
            path.push(command.name().to_string());
        }
        Self {
            path,
            version: command
                .version()
                .map(str::to_string)
                .or_else(|| self.version.clone()),
        }
    }

    /// Ancestor names and the command's own name, space-joined.
    pub fn full_name(&self) -> String {
        self.path.join(" ")
    }

    /// Own version, or the nearest ancestor's.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Usage line of `command` under `name`.
///
/// ```
/// use command_pipe_core::{help, Command};
///
/// let cmd = Command::new("build <args?...>").unwrap();
/// assert_eq!(help::usage(&cmd, "tool build"), "tool build <args?...>");
/// ```
pub fn usage(command: &Command, name: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !name.is_empty() {
        parts.push(name.to_string());
    }

    if let Some(text) = command.usage() {
        parts.push(text.to_string());
        return parts.join(" ");
    }

    if !command.options().is_empty() || command.flags().len() > 2 {
        parts.push("[options]".to_string());
    }
    parts.extend(command.arguments().iter().map(|a| a.placeholder()));
    if !command.children().is_empty() {
        parts.push("[command]".to_string());
    }
    parts.join(" ")
}

/// Full help page: usage, description, switches and children.
pub fn help(command: &Command, scope: &Scope) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("Usage: {}\n\n", usage(command, &scope.full_name())));

    if let Some(description) = command.description() {
        out.push_str(description);
        out.push_str("\n\n");
    }

    let flags = command.flags();
    let options = command.options();
    let mut switches: Vec<&Flag> = flags
        .iter()
        .chain(options.iter().map(|o| o.as_flag()))
        .collect();
    // stable: equal orders keep flags-then-options declaration order
    switches.sort_by_key(|s| s.order());

    if !switches.is_empty() {
        out.push_str("Options:\n\n");
        for switch in switches {
            out.push_str(&aligned(&switch_label(switch), SWITCH_COLUMN, switch.desc()));
        }
        out.push('\n');
    }

    if !command.children().is_empty() {
        let mut children: Vec<&Command> = command.children().iter().collect();
        children.sort_by_key(|c| c.order());
        out.push_str("Commands:\n\n");
        for child in children {
            let label = format!("  {}", usage(child, child.name()));
            out.push_str(&aligned(&label, COMMAND_COLUMN, child.description()));
        }
        out.push('\n');
    }

    out
}

/// Usage line only, framed by blank lines.
pub fn usage_page(command: &Command, scope: &Scope) -> String {
    format!("\nUsage: {}\n\n", usage(command, &scope.full_name()))
}

/// Version line.
pub fn version(scope: &Scope) -> String {
    format!("Version: {}\n", scope.version().unwrap_or("unknown"))
}

fn switch_label(flag: &Flag) -> String {
    let longs = flag.names().iter().map(|n| format!("--{n}"));
    let mut label = if flag.alias().is_empty() {
        format!("      {}", longs.collect::<Vec<_>>().join(", "))
    } else {
        let all: Vec<String> = flag
            .alias()
            .iter()
            .map(|a| format!("-{a}"))
            .chain(longs)
            .collect();
        format!("  {}", all.join(", "))
    };
    if let Some(usage) = flag.usage() {
        label.push(' ');
        label.push_str(usage);
    }
    label
}

fn aligned(label: &str, column: usize, desc: Option<&str>) -> String {
    let line = format!("{label:<column$} {}", desc.unwrap_or_default());
    format!("{}\n", line.trim_end())
}

impl Command {
    /// Prints the help page for this command at `scope` and exits with `code`.
    ///
    /// Use [`Scope::of`] for a root command, or the scope the command was
    /// reached through so the full name and inherited version are shown.
    pub fn show_help(&self, scope: &Scope, code: i32) -> ! {
        print!("{}", help(self, scope));
        std::process::exit(code)
    }

    /// Prints the version line for `scope` and exits with `code`.
    pub fn show_version(&self, scope: &Scope, code: i32) -> ! {
        print!("{}", version(scope));
        std::process::exit(code)
    }

    /// Prints the usage line for this command at `scope` and exits with `code`.
    pub fn show_usage(&self, scope: &Scope, code: i32) -> ! {
        print!("{}", usage_page(self, scope));
        std::process::exit(code)
    }
}
